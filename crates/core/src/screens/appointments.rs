use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::appointments::{Appointment, AppointmentRepository};
use crate::errors::Result;
use crate::session::SessionProvider;
use crate::sync::WriteOutcome;

/// Snapshot rendered by the appointments screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppointmentsState {
    pub is_loading: bool,
    pub appointments: Vec<Appointment>,
    pub error: Option<String>,
}

/// The signed-in user's appointments: sync once, then follow the cache.
pub struct AppointmentsScreen {
    repository: Arc<AppointmentRepository>,
    session: Arc<dyn SessionProvider>,
    state: watch::Sender<AppointmentsState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AppointmentsScreen {
    pub fn new(repository: Arc<AppointmentRepository>, session: Arc<dyn SessionProvider>) -> Self {
        let (state, _) = watch::channel(AppointmentsState::default());
        Self {
            repository,
            session,
            state,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> watch::Receiver<AppointmentsState> {
        self.state.subscribe()
    }

    pub async fn load(&self) {
        self.state.send_modify(|s| s.is_loading = true);

        let user_id = match self.session.current_user_id() {
            Ok(id) => id,
            Err(err) => {
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(err.to_string());
                });
                return;
            }
        };

        if let Err(err) = self.repository.sync_from_remote(&user_id).await {
            self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(err.to_string());
            });
        }

        let mut rx = self.repository.observe_by_user(&user_id);
        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let appointments = rx.borrow_and_update().clone();
                state.send_modify(|s| {
                    s.is_loading = false;
                    s.appointments = appointments;
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

    /// Book an appointment. Remote-first: an `Err` means nothing was
    /// stored anywhere.
    pub async fn book(&self, appointment: &Appointment) -> Result<()> {
        let result = self.repository.create(appointment).await;
        if let Err(err) = &result {
            let text = err.to_string();
            self.state.send_modify(|s| s.error = Some(text.clone()));
        }
        result
    }

    pub async fn cancel(&self, appointment_id: &str) -> Result<WriteOutcome> {
        self.repository.cancel(appointment_id).await
    }

    pub async fn confirm(&self, appointment_id: &str) -> Result<WriteOutcome> {
        self.repository.confirm(appointment_id).await
    }

    pub async fn refresh(&self) {
        self.load().await;
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }
}

impl Drop for AppointmentsScreen {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().expect("screen task lock").take() {
            task.abort();
        }
    }
}
