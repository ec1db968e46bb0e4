use diesel::prelude::*;

use tulia_core::errors::Result;
use tulia_core::resources::Resource;

use crate::db::{enum_from_db, enum_to_db, list_from_db, list_to_db};
use crate::schema::resources;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = resources)]
pub struct ResourceDB {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub kind: String,
    pub image_url: String,
    pub video_url: String,
    pub audio_url: String,
    pub pdf_url: String,
    pub tags: String,
    pub author: String,
    pub reading_time_minutes: i32,
    pub is_bookmarked: bool,
    pub likes: i32,
    pub views: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ResourceDB {
    pub fn from_domain(resource: Resource) -> Result<Self> {
        Ok(Self {
            id: resource.id,
            title: resource.title,
            description: resource.description,
            content: resource.content,
            category: enum_to_db(&resource.category)?,
            kind: enum_to_db(&resource.kind)?,
            image_url: resource.image_url,
            video_url: resource.video_url,
            audio_url: resource.audio_url,
            pdf_url: resource.pdf_url,
            tags: list_to_db(&resource.tags)?,
            author: resource.author,
            reading_time_minutes: resource.reading_time_minutes,
            is_bookmarked: resource.is_bookmarked,
            likes: resource.likes,
            views: resource.views,
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        })
    }

    pub fn into_domain(self) -> Result<Resource> {
        Ok(Resource {
            id: self.id,
            title: self.title,
            description: self.description,
            content: self.content,
            category: enum_from_db(&self.category)?,
            kind: enum_from_db(&self.kind)?,
            image_url: self.image_url,
            video_url: self.video_url,
            audio_url: self.audio_url,
            pdf_url: self.pdf_url,
            tags: list_from_db(&self.tags)?,
            author: self.author,
            reading_time_minutes: self.reading_time_minutes,
            is_bookmarked: self.is_bookmarked,
            likes: self.likes,
            views: self.views,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
