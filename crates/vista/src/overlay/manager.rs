// Overlay management: the list shown next to the player and the create/edit/delete flows.

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::model::{Overlay, OverlayForm};
use crate::VistaError;
use crate::api::OverlayStore;
use crate::report::{Notice, Reporter};

pub struct OverlayManager {
    store: Arc<dyn OverlayStore>,
    reporter: Arc<dyn Reporter>,
    overlays: Vec<Overlay>,
    selected: Option<String>,
}

impl OverlayManager {
    pub fn new(store: Arc<dyn OverlayStore>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            store,
            reporter,
            overlays: Vec::new(),
            selected: None,
        }
    }

    /// Overlays in store order, which is also their paint order.
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn selected(&self) -> Option<&Overlay> {
        let id = self.selected.as_deref()?;
        self.overlays.iter().find(|o| o.id.as_deref() == Some(id))
    }

    /// Selects an overlay for editing and returns the pre-filled form.
    pub fn select(&mut self, id: &str) -> Option<OverlayForm> {
        let overlay = self.overlays.iter().find(|o| o.id.as_deref() == Some(id))?;
        let form = OverlayForm::from_overlay(overlay);
        self.selected = Some(id.to_string());
        Some(form)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Reloads the list from the store. On failure the current list is kept.
    pub async fn refresh(&mut self) -> Result<(), VistaError> {
        match self.store.list().await {
            Ok(overlays) => {
                debug!(count = overlays.len(), "Overlay list refreshed");
                self.overlays = overlays;
                if self.selected().is_none() {
                    self.selected = None;
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Error fetching overlays");
                Err(e)
            }
        }
    }

    /// Updates the selected overlay, or creates a new one when nothing is selected.
    pub async fn save(&mut self, form: &OverlayForm) -> Result<Overlay, VistaError> {
        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(e) => {
                self.reporter.notify(Notice::warning(e.to_string()));
                return Err(e);
            }
        };

        let (result, action) = match self.selected.clone() {
            Some(id) => (self.store.update(&id, &draft).await, "updated"),
            None => (self.store.create(&draft).await, "created"),
        };

        match result {
            Ok(saved) => {
                self.reporter
                    .notify(Notice::info(format!("Overlay {action} successfully!")));
                if self.refresh().await.is_err() {
                    self.merge_local(saved.clone());
                }
                self.selected = None;
                Ok(saved)
            }
            Err(e) => {
                error!(error = %e, "Error saving overlay");
                self.reporter
                    .notify(Notice::error(format!("Failed to save overlay: {e}")));
                Err(e)
            }
        }
    }

    /// Deletes the selected overlay. Returns `false` when nothing is selected.
    pub async fn delete_selected(&mut self) -> Result<bool, VistaError> {
        let Some(id) = self.selected.clone() else {
            return Ok(false);
        };

        match self.store.delete(&id).await {
            Ok(()) => {
                self.reporter
                    .notify(Notice::info("Overlay deleted successfully!"));
                if self.refresh().await.is_err() {
                    self.overlays.retain(|o| o.id.as_deref() != Some(id.as_str()));
                }
                self.selected = None;
                Ok(true)
            }
            Err(e) => {
                error!(id = %id, error = %e, "Error deleting overlay");
                self.reporter
                    .notify(Notice::error(format!("Failed to delete overlay: {e}")));
                Err(e)
            }
        }
    }

    fn merge_local(&mut self, saved: Overlay) {
        warn!("Overlay list could not be reloaded, applying saved overlay locally");
        match self
            .overlays
            .iter_mut()
            .find(|o| o.id.is_some() && o.id == saved.id)
        {
            Some(existing) => *existing = saved,
            None => self.overlays.push(saved),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{OverlayDraft, OverlayKind};
    use crate::report::NoticeLevel;
    use crate::session::testing::RecordingReporter;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;

    #[derive(Default)]
    struct MemoryStore {
        overlays: Mutex<Vec<Overlay>>,
        next_id: Mutex<u32>,
        fail_writes: Mutex<bool>,
        fail_list: Mutex<bool>,
    }

    fn server_error() -> VistaError {
        VistaError::StatusCode {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "database unavailable".into(),
        }
    }

    fn overlay_from(id: String, draft: &OverlayDraft) -> Overlay {
        Overlay {
            id: Some(id),
            name: draft.name.clone(),
            kind: draft.kind,
            content: draft.content.clone(),
            color: draft.color.clone(),
            position: Some(draft.position),
            size: Some(draft.size),
        }
    }

    #[async_trait]
    impl OverlayStore for MemoryStore {
        async fn list(&self) -> Result<Vec<Overlay>, VistaError> {
            if *self.fail_list.lock() {
                return Err(server_error());
            }
            Ok(self.overlays.lock().clone())
        }

        async fn create(&self, draft: &OverlayDraft) -> Result<Overlay, VistaError> {
            if *self.fail_writes.lock() {
                return Err(server_error());
            }
            let mut next = self.next_id.lock();
            *next += 1;
            let overlay = overlay_from(format!("o{next}"), draft);
            self.overlays.lock().push(overlay.clone());
            Ok(overlay)
        }

        async fn update(&self, id: &str, draft: &OverlayDraft) -> Result<Overlay, VistaError> {
            if *self.fail_writes.lock() {
                return Err(server_error());
            }
            let mut overlays = self.overlays.lock();
            let existing = overlays
                .iter_mut()
                .find(|o| o.id.as_deref() == Some(id))
                .ok_or_else(server_error)?;
            *existing = overlay_from(id.to_string(), draft);
            Ok(existing.clone())
        }

        async fn delete(&self, id: &str) -> Result<(), VistaError> {
            if *self.fail_writes.lock() {
                return Err(server_error());
            }
            self.overlays.lock().retain(|o| o.id.as_deref() != Some(id));
            Ok(())
        }
    }

    fn form(name: &str, content: &str) -> OverlayForm {
        OverlayForm {
            name: name.into(),
            content: content.into(),
            kind: OverlayKind::Text,
            color: "#ffffff".into(),
            x: "10".into(),
            y: "20".into(),
            width: "100".into(),
            height: "30".into(),
        }
    }

    fn manager() -> (OverlayManager, Arc<MemoryStore>, Arc<RecordingReporter>) {
        let store = Arc::new(MemoryStore::default());
        let reporter = RecordingReporter::new();
        let manager = OverlayManager::new(store.clone(), reporter.clone());
        (manager, store, reporter)
    }

    #[tokio::test]
    async fn test_create_then_edit() {
        let (mut manager, _store, reporter) = manager();

        let created = manager.save(&form("Live", "LIVE")).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("o1"));
        assert_eq!(manager.overlays().len(), 1);

        let mut edit = manager.select("o1").unwrap();
        assert_eq!(edit.name, "Live");
        edit.content = "ON AIR".into();
        let updated = manager.save(&edit).await.unwrap();

        assert_eq!(updated.id.as_deref(), Some("o1"));
        assert_eq!(manager.overlays()[0].content, "ON AIR");
        assert!(manager.selected().is_none());

        let messages: Vec<_> = reporter.notices().into_iter().map(|n| n.message).collect();
        assert_eq!(
            messages,
            vec![
                "Overlay created successfully!",
                "Overlay updated successfully!"
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_save_keeps_state() {
        let (mut manager, store, reporter) = manager();
        manager.save(&form("Live", "LIVE")).await.unwrap();
        manager.select("o1").unwrap();

        *store.fail_writes.lock() = true;
        let mut edit = form("Live", "CHANGED");
        edit.kind = OverlayKind::Text;
        assert!(manager.save(&edit).await.is_err());

        assert_eq!(manager.overlays()[0].content, "LIVE");
        assert_eq!(manager.selected().and_then(|o| o.id.as_deref()), Some("o1"));
        let last = reporter.notices().pop().unwrap();
        assert_eq!(last.level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let (mut manager, store, reporter) = manager();
        let result = manager.save(&form("", "LIVE")).await;
        assert!(matches!(result, Err(VistaError::InvalidInput(_))));
        assert!(store.overlays.lock().is_empty());
        assert_eq!(reporter.notices()[0].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_delete_selected() {
        let (mut manager, _store, reporter) = manager();
        assert!(!manager.delete_selected().await.unwrap());

        manager.save(&form("a", "A")).await.unwrap();
        manager.save(&form("b", "B")).await.unwrap();
        manager.select("o1").unwrap();
        assert!(manager.delete_selected().await.unwrap());

        let ids: Vec<_> = manager
            .overlays()
            .iter()
            .filter_map(|o| o.id.as_deref())
            .collect();
        assert_eq!(ids, ["o2"]);
        assert_eq!(
            reporter.notices().last().unwrap().message,
            "Overlay deleted successfully!"
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_list_and_merges_saved() {
        let (mut manager, store, _reporter) = manager();
        manager.save(&form("a", "A")).await.unwrap();

        *store.fail_list.lock() = true;
        assert!(manager.refresh().await.is_err());
        assert_eq!(manager.overlays().len(), 1);

        manager.save(&form("b", "B")).await.unwrap();
        assert_eq!(manager.overlays().len(), 2);
    }

    #[test]
    fn test_select_unknown_id() {
        let (mut manager, _store, _reporter) = manager();
        assert!(manager.select("missing").is_none());
        assert!(manager.selected().is_none());
    }
}
