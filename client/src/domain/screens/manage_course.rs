//! Admin course editor: modules and every chapter they hold.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::{collate, reject, report_failure};
use crate::domain::gateway_errors::map_data_error;
use crate::domain::ports::{
    DataGateway, DataGatewayError, Filter, Notification, Notifier, Query, Record, Table,
    decode_record, decode_rows, encode_record,
};
use crate::domain::{
    AdminAccess, Chapter, ChapterDraft, ChapterId, Error, Module, ModuleId, ModuleTitle,
};

/// Notification when the course cannot be read.
pub const LOAD_COURSE_FAILED: &str = "Failed to load course data";
/// Notification when a module write fails.
pub const SAVE_MODULE_FAILED: &str = "Failed to save module";
/// Notification when a module delete fails.
pub const DELETE_MODULE_FAILED: &str = "Failed to delete module";
/// Notification when a chapter write fails.
pub const SAVE_CHAPTER_FAILED: &str = "Failed to save chapter";
/// Notification when a chapter delete fails.
pub const DELETE_CHAPTER_FAILED: &str = "Failed to delete chapter";

/// A module together with all of its chapters, drafts included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseModule {
    /// The module row.
    pub module: Module,
    /// Chapters ordered by title.
    pub chapters: Vec<Chapter>,
}

/// Course CRUD screen. Requires [`AdminAccess`].
pub struct ManageCourseScreen {
    access: AdminAccess,
    data: Arc<dyn DataGateway>,
    notifier: Arc<dyn Notifier>,
    course: Vec<CourseModule>,
    loading: bool,
}

impl ManageCourseScreen {
    /// Empty screen; call [`ManageCourseScreen::load`] to populate it.
    pub fn new(
        access: AdminAccess,
        data: Arc<dyn DataGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            access,
            data,
            notifier,
            course: Vec::new(),
            loading: true,
        }
    }

    /// Fetch modules and chapters, both ordered by title.
    pub async fn load(&mut self) -> Result<(), Error> {
        let result = self.fetch().await;
        self.loading = false;
        let (modules, chapters) = result.map_err(|err| {
            report_failure(self.notifier.as_ref(), LOAD_COURSE_FAILED, map_data_error(err))
        })?;
        self.course = modules
            .into_iter()
            .map(|module| {
                let chapters = chapters
                    .iter()
                    .filter(|chapter| chapter.module_id() == module.id())
                    .cloned()
                    .collect();
                CourseModule { module, chapters }
            })
            .collect();
        Ok(())
    }

    async fn fetch(&self) -> Result<(Vec<Module>, Vec<Chapter>), DataGatewayError> {
        let ordered = Query::new().order_by("title");
        let modules = decode_rows(self.data.select(Table::Modules, &ordered).await?)?;
        let chapters = decode_rows(self.data.select(Table::Chapters, &ordered).await?)?;
        Ok((modules, chapters))
    }

    /// True until the first response arrives.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Modules ordered by title, each with its chapters.
    pub fn course(&self) -> &[CourseModule] {
        &self.course
    }

    /// Look up a listed module.
    pub fn module(&self, id: &ModuleId) -> Option<&CourseModule> {
        self.course.iter().find(|entry| entry.module.id() == id)
    }

    /// Create a module with `title`.
    pub async fn create_module(&mut self, title: &str) -> Result<Module, Error> {
        let title = ModuleTitle::new(title)
            .map_err(|err| reject(self.notifier.as_ref(), Error::invalid_request(err.to_string())))?;
        let mut record = Record::new();
        record.insert("title".to_owned(), Value::String(title.into()));

        let module = self
            .data
            .insert(Table::Modules, record)
            .await
            .and_then(decode_record::<Module>)
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), SAVE_MODULE_FAILED, map_data_error(err))
            })?;
        info!(admin = %self.access.admin_id(), module_id = %module.id(), "module created");
        self.course.push(CourseModule {
            module: module.clone(),
            chapters: Vec::new(),
        });
        self.sort_modules();
        self.notifier
            .notify(Notification::success("Module created successfully"));
        Ok(module)
    }

    /// Rename a listed module. The list changes only after the gateway
    /// accepts the update.
    pub async fn rename_module(&mut self, id: &ModuleId, title: &str) -> Result<(), Error> {
        let title = ModuleTitle::new(title)
            .map_err(|err| reject(self.notifier.as_ref(), Error::invalid_request(err.to_string())))?;
        let position = self.module_position(id)?;
        let mut patch = Record::new();
        patch.insert("title".to_owned(), Value::String(title.clone().into()));

        self.data
            .update(Table::Modules, patch, &Filter::eq("id", id.as_ref()))
            .await
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), SAVE_MODULE_FAILED, map_data_error(err))
            })?;
        info!(admin = %self.access.admin_id(), module_id = %id, "module renamed");
        if let Some(entry) = self.course.get_mut(position) {
            entry.module = entry.module.renamed(title);
        }
        self.sort_modules();
        self.notifier
            .notify(Notification::success("Module updated successfully"));
        Ok(())
    }

    /// Delete a listed module. Modules that still list chapters are kept.
    pub async fn delete_module(&mut self, id: &ModuleId) -> Result<(), Error> {
        let position = self.module_position(id)?;
        let has_chapters = self
            .course
            .get(position)
            .is_some_and(|entry| !entry.chapters.is_empty());
        if has_chapters {
            return Err(reject(
                self.notifier.as_ref(),
                Error::conflict("Delete the module's chapters first"),
            ));
        }

        self.data
            .delete(Table::Modules, &Filter::eq("id", id.as_ref()))
            .await
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), DELETE_MODULE_FAILED, map_data_error(err))
            })?;
        info!(admin = %self.access.admin_id(), module_id = %id, "module deleted");
        self.course.retain(|entry| entry.module.id() != id);
        self.notifier
            .notify(Notification::success("Module deleted successfully"));
        Ok(())
    }

    /// Create a chapter inside a listed module.
    pub async fn create_chapter(&mut self, draft: ChapterDraft) -> Result<Chapter, Error> {
        self.module_position(&draft.module_id)?;
        let record = encode_record(&draft).map_err(|err| {
            report_failure(self.notifier.as_ref(), SAVE_CHAPTER_FAILED, map_data_error(err))
        })?;

        let chapter = self
            .data
            .insert(Table::Chapters, record)
            .await
            .and_then(decode_record::<Chapter>)
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), SAVE_CHAPTER_FAILED, map_data_error(err))
            })?;
        info!(admin = %self.access.admin_id(), chapter_id = %chapter.id(), "chapter created");
        self.place_chapter(chapter.clone());
        self.notifier
            .notify(Notification::success("Chapter created successfully"));
        Ok(chapter)
    }

    /// Replace every editable field of a listed chapter.
    pub async fn edit_chapter(&mut self, id: &ChapterId, draft: ChapterDraft) -> Result<(), Error> {
        let current = self.chapter(id)?.clone();
        self.module_position(&draft.module_id)?;
        let patch = encode_record(&draft).map_err(|err| {
            report_failure(self.notifier.as_ref(), SAVE_CHAPTER_FAILED, map_data_error(err))
        })?;

        self.data
            .update(Table::Chapters, patch, &Filter::eq("id", id.as_ref()))
            .await
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), SAVE_CHAPTER_FAILED, map_data_error(err))
            })?;
        info!(admin = %self.access.admin_id(), chapter_id = %id, "chapter updated");
        self.remove_chapter(id);
        self.place_chapter(current.with_draft(draft));
        self.notifier
            .notify(Notification::success("Chapter updated successfully"));
        Ok(())
    }

    /// Delete a listed chapter.
    pub async fn delete_chapter(&mut self, id: &ChapterId) -> Result<(), Error> {
        self.chapter(id)?;
        self.data
            .delete(Table::Chapters, &Filter::eq("id", id.as_ref()))
            .await
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), DELETE_CHAPTER_FAILED, map_data_error(err))
            })?;
        info!(admin = %self.access.admin_id(), chapter_id = %id, "chapter deleted");
        self.remove_chapter(id);
        self.notifier
            .notify(Notification::success("Chapter deleted successfully"));
        Ok(())
    }

    fn module_position(&self, id: &ModuleId) -> Result<usize, Error> {
        self.course
            .iter()
            .position(|entry| entry.module.id() == id)
            .ok_or_else(|| Error::not_found(format!("module {id} is not listed")))
    }

    fn chapter(&self, id: &ChapterId) -> Result<&Chapter, Error> {
        self.course
            .iter()
            .flat_map(|entry| entry.chapters.iter())
            .find(|chapter| chapter.id() == id)
            .ok_or_else(|| Error::not_found(format!("chapter {id} is not listed")))
    }

    fn remove_chapter(&mut self, id: &ChapterId) {
        for entry in &mut self.course {
            entry.chapters.retain(|chapter| chapter.id() != id);
        }
    }

    fn place_chapter(&mut self, chapter: Chapter) {
        if let Some(entry) = self
            .course
            .iter_mut()
            .find(|entry| entry.module.id() == chapter.module_id())
        {
            entry.chapters.push(chapter);
            entry
                .chapters
                .sort_by(|a, b| collate(a.title().as_ref(), b.title().as_ref()));
        }
    }

    fn sort_modules(&mut self) {
        self.course
            .sort_by(|a, b| collate(a.module.title().as_ref(), b.module.title().as_ref()));
    }
}

#[cfg(test)]
#[path = "manage_course_tests.rs"]
mod tests;
