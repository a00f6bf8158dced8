//! One editing session: a document, its fields, the current data record and
//! the live preview.
//!
//! The session owns every piece of mutable state for one open document.
//! Nothing is global; closing the session cancels pending preview work and
//! releases the last rendered output.

use std::collections::HashMap;
use std::sync::Arc;

use engine::engine::{Action, Editor};
use engine::overlay::{DateFormat, GenerateOptions};
use engine::record::{GenerationRecord, RecordError};
use engine::render::DocumentRenderer;
use engine::template::{Template, TemplateError, parse_template};
use engine::transform::PageDimensions;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::preview::{PreviewError, PreviewOutput, PreviewRequest, PreviewScheduler, PreviewState};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Preview(#[from] PreviewError),
}

pub struct EditorSession {
    id: Uuid,
    name: String,
    page_count: u32,
    default_page_size: PageDimensions,
    editor: Editor,
    /// Page sizes in document points, used for generation.
    document_pages: HashMap<u32, PageDimensions>,
    record: GenerationRecord,
    options: GenerateOptions,
    extension: &'static str,
    preview: PreviewScheduler,
}

impl EditorSession {
    /// Open a session for a document with `page_count` pages, all of the
    /// configured default size until told otherwise.
    #[must_use]
    pub fn new(name: impl Into<String>, page_count: u32, config: &AppConfig, renderer: Arc<dyn DocumentRenderer>) -> Self {
        let id = Uuid::new_v4();
        let name = name.into();
        info!(session_id = %id, %name, page_count, "session opened");
        let mut session = Self {
            id,
            name,
            page_count: 0,
            default_page_size: config.default_page_size,
            editor: Editor::new(),
            document_pages: HashMap::new(),
            record: GenerationRecord::new(),
            options: GenerateOptions { date_format: config.date_format },
            extension: renderer.file_extension(),
            preview: PreviewScheduler::new(config.preview_debounce, renderer),
        };
        session.set_page_count(page_count);
        session
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    #[must_use]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Direct access for input handling. Pass the returned actions through
    /// [`EditorSession::apply`] to keep the preview current.
    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    #[must_use]
    pub fn record(&self) -> &GenerationRecord {
        &self.record
    }

    #[must_use]
    pub fn document_page(&self, page_number: u32) -> Option<PageDimensions> {
        self.document_pages.get(&page_number).copied()
    }

    // --- Document ---

    /// Set the page count; new pages get the default size, pages past the
    /// end are forgotten.
    pub fn set_page_count(&mut self, page_count: u32) {
        self.page_count = page_count;
        self.document_pages.retain(|page, _| *page <= page_count);
        for page in 1..=page_count {
            self.document_pages.entry(page).or_insert(self.default_page_size);
        }
    }

    /// Size of a page in document points.
    pub fn set_document_page(&mut self, page_number: u32, dims: PageDimensions) {
        if page_number == 0 || page_number > self.page_count {
            debug!(page = page_number, "document page out of range; ignored");
            return;
        }
        self.document_pages.insert(page_number, dims);
    }

    /// Pixel size of a rendered page image, for pointer input.
    pub fn set_rendered_page(&mut self, page_number: u32, dims: PageDimensions) {
        self.editor.set_page_dimensions(page_number, dims);
    }

    // --- Templates ---

    /// Replace all fields with those of an imported template. On error the
    /// session is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Template`] for malformed input.
    pub fn import_template(&mut self, text: &str) -> Result<usize, SessionError> {
        let template = parse_template(text)?;
        let count = template.fields.len();
        self.name = template.name;
        if template.page_count > self.page_count {
            self.set_page_count(template.page_count);
        }
        self.editor.load_fields(template.fields);
        info!(session_id = %self.id, fields = count, "template imported");
        self.refresh_preview();
        Ok(count)
    }

    /// Current fields as template JSON, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Template`] if serialization fails.
    pub fn export_template(&self) -> Result<String, SessionError> {
        let fields = self.editor.registry.fields().to_vec();
        let template = Template::from_fields(self.name.clone(), self.page_count, fields, OffsetDateTime::now_utc())?;
        Ok(template.to_json()?)
    }

    /// `<name>_filled.<ext>` for the session's renderer.
    #[must_use]
    pub fn output_file_name(&self) -> String {
        format!("{}_filled.{}", self.name, self.extension)
    }

    // --- Data ---

    /// Replace the data record and schedule a preview. On error the current
    /// record is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Record`] for malformed JSON.
    pub fn set_record_json(&mut self, text: &str) -> Result<(), SessionError> {
        self.record = GenerationRecord::from_json(text)?;
        debug!(session_id = %self.id, keys = self.record.len(), "record updated");
        self.refresh_preview();
        Ok(())
    }

    pub fn set_date_format(&mut self, date_format: DateFormat) {
        self.options.date_format = date_format;
        self.refresh_preview();
    }

    /// Forward editor actions, refreshing the preview when fields changed.
    pub fn apply(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let fields_changed = actions.iter().any(|a| {
            matches!(a, Action::FieldCreated(_) | Action::FieldUpdated { .. } | Action::FieldDeleted { .. })
        });
        if fields_changed {
            self.refresh_preview();
        }
        actions
    }

    // --- Preview ---

    /// Snapshot of everything a preview render needs.
    #[must_use]
    pub fn preview_request(&self) -> PreviewRequest {
        PreviewRequest {
            fields: self.editor.registry.fields().to_vec(),
            page_dims: self.document_pages.clone(),
            record: self.record.clone(),
            options: self.options,
            file_name: self.output_file_name(),
        }
    }

    /// Schedule a debounced preview, superseding any pending one.
    ///
    /// An empty record still schedules, so clearing the record replaces an
    /// older preview with an empty one.
    pub fn refresh_preview(&mut self) {
        let request = self.preview_request();
        self.preview.schedule(request);
    }

    /// Render immediately, skipping the debounce.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Preview`] when rendering fails.
    pub async fn render_now(&mut self) -> Result<Arc<PreviewOutput>, SessionError> {
        let request = self.preview_request();
        Ok(self.preview.render_now(request).await?)
    }

    #[must_use]
    pub fn subscribe_preview(&self) -> watch::Receiver<PreviewState> {
        self.preview.subscribe()
    }

    #[must_use]
    pub fn latest_preview(&self) -> PreviewState {
        self.preview.latest()
    }

    /// End the session, cancelling pending work and releasing the last output.
    pub fn close(mut self) {
        self.preview.close();
        info!(session_id = %self.id, "session closed");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
