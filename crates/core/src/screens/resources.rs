use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::resources::{Resource, ResourceCategory, ResourceRepository};

/// Snapshot rendered by the resource library screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceLibraryState {
    pub is_loading: bool,
    pub resources: Vec<Resource>,
    pub filtered: Vec<Resource>,
    pub search_query: String,
    pub selected_category: Option<ResourceCategory>,
    pub error: Option<String>,
}

/// Resource library: sync once, then follow the cache. Search and the
/// category filter are applied over the observed snapshot.
pub struct ResourceLibrary {
    repository: Arc<ResourceRepository>,
    state: watch::Sender<ResourceLibraryState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceLibrary {
    pub fn new(repository: Arc<ResourceRepository>) -> Self {
        let (state, _) = watch::channel(ResourceLibraryState::default());
        Self {
            repository,
            state,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> watch::Receiver<ResourceLibraryState> {
        self.state.subscribe()
    }

    pub async fn load(&self) {
        self.state.send_modify(|s| s.is_loading = true);

        if let Err(err) = self.repository.sync_from_remote().await {
            self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(err.to_string());
            });
        }

        let mut rx = self.repository.observe_all();
        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let resources = rx.borrow_and_update().clone();
                state.send_modify(|s| {
                    s.is_loading = false;
                    s.filtered = apply_filters(&resources, s);
                    s.resources = resources;
                });
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        if let Some(previous) = self.task.lock().expect("screen task lock").replace(handle) {
            previous.abort();
        }
    }

    pub fn search(&self, query: &str) {
        self.state.send_modify(|s| {
            s.search_query = query.trim().to_string();
            let list = s.resources.clone();
            s.filtered = apply_filters(&list, s);
        });
    }

    pub fn filter_by_category(&self, category: Option<ResourceCategory>) {
        self.state.send_modify(|s| {
            s.selected_category = category;
            let list = s.resources.clone();
            s.filtered = apply_filters(&list, s);
        });
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }
}

impl Drop for ResourceLibrary {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().expect("screen task lock").take() {
            task.abort();
        }
    }
}

fn apply_filters(resources: &[Resource], state: &ResourceLibraryState) -> Vec<Resource> {
    let query = state.search_query.to_lowercase();
    resources
        .iter()
        .filter(|r| {
            state
                .selected_category
                .is_none_or(|category| r.category == category)
        })
        .filter(|r| {
            query.is_empty()
                || r.title.to_lowercase().contains(&query)
                || r.description.to_lowercase().contains(&query)
                || r.tags.iter().any(|t| t.to_lowercase().contains(&query))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(id: &str, title: &str, category: ResourceCategory, tags: &[&str]) -> Resource {
        Resource {
            id: id.into(),
            title: title.into(),
            category,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Resource::default()
        }
    }

    #[test]
    fn search_spans_title_description_and_tags() {
        let resources = vec![
            resource("r1", "Exam stress", ResourceCategory::Anxiety, &[]),
            resource("r2", "Sleep guide", ResourceCategory::SelfCare, &["stress"]),
            resource("r3", "Budgeting", ResourceCategory::General, &[]),
        ];
        let state = ResourceLibraryState {
            search_query: "Stress".into(),
            ..ResourceLibraryState::default()
        };
        let filtered = apply_filters(&resources, &state);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn category_filter_narrows_the_list() {
        let resources = vec![
            resource("r1", "A", ResourceCategory::Anxiety, &[]),
            resource("r2", "B", ResourceCategory::Mindfulness, &[]),
        ];
        let state = ResourceLibraryState {
            selected_category: Some(ResourceCategory::Mindfulness),
            ..ResourceLibraryState::default()
        };
        let filtered = apply_filters(&resources, &state);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "r2");
    }
}
