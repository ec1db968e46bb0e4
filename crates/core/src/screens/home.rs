use std::sync::Arc;

use tokio::sync::watch;

use crate::appointments::{Appointment, AppointmentRepository, AppointmentStatus};
use crate::resources::{Resource, ResourceRepository};
use crate::session::SessionProvider;
use crate::users::{User, UserRepository};
use crate::utils::now_millis;

const POPULAR_RESOURCES_LIMIT: i64 = 10;

/// Snapshot rendered by the home screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HomeState {
    pub is_loading: bool,
    pub current_user: Option<User>,
    pub upcoming_appointments: Vec<Appointment>,
    pub popular_resources: Vec<Resource>,
    pub error: Option<String>,
}

/// Home dashboard. One refresh fetches the signed-in user first; the
/// appointment and resource sections only load once that succeeds.
pub struct HomeScreen {
    users: Arc<UserRepository>,
    appointments: Arc<AppointmentRepository>,
    resources: Arc<ResourceRepository>,
    session: Arc<dyn SessionProvider>,
    state: watch::Sender<HomeState>,
}

impl HomeScreen {
    pub fn new(
        users: Arc<UserRepository>,
        appointments: Arc<AppointmentRepository>,
        resources: Arc<ResourceRepository>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        let (state, _) = watch::channel(HomeState::default());
        Self {
            users,
            appointments,
            resources,
            session,
            state,
        }
    }

    pub fn state(&self) -> watch::Receiver<HomeState> {
        self.state.subscribe()
    }

    pub async fn refresh(&self) {
        self.state.send_modify(|s| s.is_loading = true);

        let loaded = self.load_sections().await;
        match loaded {
            Ok((user, upcoming, popular)) => self.state.send_modify(|s| {
                s.is_loading = false;
                s.current_user = Some(user);
                s.upcoming_appointments = upcoming;
                s.popular_resources = popular;
                s.error = None;
            }),
            Err(message) => self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(message);
            }),
        }
    }

    async fn load_sections(
        &self,
    ) -> std::result::Result<(User, Vec<Appointment>, Vec<Resource>), String> {
        let user_id = self
            .session
            .current_user_id()
            .map_err(|e| e.to_string())?;
        let user = self
            .users
            .get_by_id(&user_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "User not found".to_string())?;

        let now = now_millis();
        let upcoming = self
            .appointments
            .list_by_user(&user.id)
            .map_err(|e| e.to_string())?
            .into_iter()
            .filter(|a| {
                a.scheduled_date_time >= now
                    && matches!(
                        a.status,
                        AppointmentStatus::Pending | AppointmentStatus::Confirmed
                    )
            })
            .collect();
        let popular = self
            .resources
            .list_popular(POPULAR_RESOURCES_LIMIT)
            .map_err(|e| e.to_string())?;

        Ok((user, upcoming, popular))
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }
}
