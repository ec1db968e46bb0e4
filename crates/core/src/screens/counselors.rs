use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::counselors::{Counselor, CounselorRepository};

/// Snapshot rendered by the counselor directory screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CounselorDirectoryState {
    pub is_loading: bool,
    pub counselors: Vec<Counselor>,
    pub filtered: Vec<Counselor>,
    pub search_query: String,
    pub selected_specialization: Option<String>,
    pub available_only: bool,
    pub error: Option<String>,
}

/// Counselor directory: sync once, then follow the cache ordered by rating.
/// Search and filters are applied over the observed snapshot.
pub struct CounselorDirectory {
    repository: Arc<CounselorRepository>,
    state: watch::Sender<CounselorDirectoryState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CounselorDirectory {
    pub fn new(repository: Arc<CounselorRepository>) -> Self {
        let (state, _) = watch::channel(CounselorDirectoryState::default());
        Self {
            repository,
            state,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> watch::Receiver<CounselorDirectoryState> {
        self.state.subscribe()
    }

    /// Sync the directory, then keep the snapshot in step with the cache.
    pub async fn load(&self) {
        self.state.send_modify(|s| s.is_loading = true);

        if let Err(err) = self.repository.sync_from_remote().await {
            self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(err.to_string());
            });
        }

        let mut rx = self.repository.observe_by_rating();
        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let counselors = rx.borrow_and_update().clone();
                state.send_modify(|s| {
                    s.is_loading = false;
                    s.filtered = apply_filters(&counselors, s);
                    s.counselors = counselors;
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
            let list = s.counselors.clone();
            s.filtered = apply_filters(&list, s);
        });
    }

    pub fn filter_by_specialization(&self, specialization: Option<String>) {
        self.state.send_modify(|s| {
            s.selected_specialization = specialization;
            let list = s.counselors.clone();
            s.filtered = apply_filters(&list, s);
        });
    }

    pub fn show_available_only(&self, available_only: bool) {
        self.state.send_modify(|s| {
            s.available_only = available_only;
            let list = s.counselors.clone();
            s.filtered = apply_filters(&list, s);
        });
    }

    pub async fn refresh(&self) {
        self.load().await;
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }
}

impl Drop for CounselorDirectory {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().expect("screen task lock").take() {
            task.abort();
        }
    }
}

fn apply_filters(
    counselors: &[Counselor],
    state: &CounselorDirectoryState,
) -> Vec<Counselor> {
    let query = state.search_query.to_lowercase();
    counselors
        .iter()
        .filter(|c| !state.available_only || c.is_available)
        .filter(|c| {
            state
                .selected_specialization
                .as_ref()
                .is_none_or(|wanted| c.specializations.iter().any(|s| s == wanted))
        })
        .filter(|c| {
            query.is_empty()
                || c.full_name().to_lowercase().contains(&query)
                || c.specializations_text().to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counselor(id: &str, specialization: &str, available: bool) -> Counselor {
        Counselor {
            id: id.into(),
            specializations: vec![specialization.into()],
            is_available: available,
            ..Counselor::default()
        }
    }

    #[test]
    fn filters_compose() {
        let counselors = vec![
            counselor("c1", "Anxiety", true),
            counselor("c2", "Anxiety", false),
            counselor("c3", "Depression", true),
        ];
        let state = CounselorDirectoryState {
            available_only: true,
            selected_specialization: Some("Anxiety".into()),
            ..CounselorDirectoryState::default()
        };
        let filtered = apply_filters(&counselors, &state);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "c1");
    }

    #[test]
    fn search_matches_specializations_case_insensitively() {
        let counselors = vec![
            counselor("c1", "Stress Management", true),
            counselor("c2", "Depression", true),
        ];
        let state = CounselorDirectoryState {
            search_query: "stress".into(),
            ..CounselorDirectoryState::default()
        };
        let filtered = apply_filters(&counselors, &state);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "c1");
    }
}
