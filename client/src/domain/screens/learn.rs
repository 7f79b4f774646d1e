//! Learner view: modules, their live chapters and the video player.

use std::sync::Arc;

use tracing::debug;

use super::report_failure;
use crate::domain::gateway_errors::map_data_error;
use crate::domain::ports::{DataGateway, Notifier, Query, Table, decode_rows};
use crate::domain::{
    Chapter, ChapterId, ChapterStatus, ChapterTitle, Error, Module, ModuleId, VideoLink,
};

/// Notification when the module list cannot be read.
pub const LOAD_MODULES_FAILED: &str = "Failed to load modules";
/// Notification when the chapter list cannot be read.
pub const LOAD_CHAPTERS_FAILED: &str = "Failed to load chapters";

/// What the player area shows for the selected chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    /// Chapter heading.
    pub title: ChapterTitle,
    /// Original link.
    pub link: VideoLink,
    /// Embeddable player URL; `None` when the link has no video id.
    pub embed_url: Option<String>,
}

/// Module/chapter browser for every signed-in user.
///
/// ## Invariants
/// - `chapters` only holds live chapters of the selected module.
/// - `selected_chapter`, when set, is an element of `chapters`.
pub struct LearnScreen {
    data: Arc<dyn DataGateway>,
    notifier: Arc<dyn Notifier>,
    modules: Vec<Module>,
    chapters: Vec<Chapter>,
    selected_module: Option<ModuleId>,
    selected_chapter: Option<ChapterId>,
    loading: bool,
}

impl LearnScreen {
    /// Empty screen; call [`LearnScreen::load`] to populate it.
    pub fn new(data: Arc<dyn DataGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            data,
            notifier,
            modules: Vec::new(),
            chapters: Vec::new(),
            selected_module: None,
            selected_chapter: None,
            loading: true,
        }
    }

    /// Fetch modules ordered by title, select the first one when nothing
    /// valid is selected, then fetch its chapters.
    pub async fn load(&mut self) -> Result<(), Error> {
        let fetched = self
            .data
            .select(Table::Modules, &Query::new().order_by("title"))
            .await
            .and_then(decode_rows::<Module>);
        self.loading = false;
        let modules = fetched
            .map_err(|err| report_failure(self.notifier.as_ref(), LOAD_MODULES_FAILED, map_data_error(err)))?;
        debug!(count = modules.len(), "modules loaded");
        self.modules = modules;

        let still_listed = self
            .selected_module
            .as_ref()
            .is_some_and(|id| self.modules.iter().any(|module| module.id() == id));
        if !still_listed {
            self.selected_module = self.modules.first().map(|module| module.id().clone());
        }
        self.load_chapters().await
    }

    /// Switch to another module and fetch its chapters.
    pub async fn select_module(&mut self, id: &ModuleId) -> Result<(), Error> {
        if !self.modules.iter().any(|module| module.id() == id) {
            return Err(Error::not_found(format!("module {id} is not listed")));
        }
        self.selected_module = Some(id.clone());
        self.load_chapters().await
    }

    /// Play another chapter of the selected module.
    pub fn select_chapter(&mut self, id: &ChapterId) -> Result<(), Error> {
        if !self.chapters.iter().any(|chapter| chapter.id() == id) {
            return Err(Error::not_found(format!("chapter {id} is not listed")));
        }
        self.selected_chapter = Some(id.clone());
        Ok(())
    }

    async fn load_chapters(&mut self) -> Result<(), Error> {
        let Some(module_id) = self.selected_module.clone() else {
            self.chapters.clear();
            self.selected_chapter = None;
            return Ok(());
        };
        let query = Query::new()
            .eq("module_id", module_id.as_ref())
            .eq("status", ChapterStatus::Live.as_str())
            .order_by("title");
        let mut chapters = self
            .data
            .select(Table::Chapters, &query)
            .await
            .and_then(decode_rows::<Chapter>)
            .map_err(|err| {
                report_failure(self.notifier.as_ref(), LOAD_CHAPTERS_FAILED, map_data_error(err))
            })?;
        chapters.retain(|chapter| chapter.is_live() && chapter.module_id() == &module_id);
        debug!(module_id = %module_id, count = chapters.len(), "chapters loaded");
        self.chapters = chapters;

        let still_listed = self
            .selected_chapter
            .as_ref()
            .is_some_and(|id| self.chapters.iter().any(|chapter| chapter.id() == id));
        if !still_listed {
            self.selected_chapter = self.chapters.first().map(|chapter| chapter.id().clone());
        }
        Ok(())
    }

    /// True until the first module response arrives.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Modules ordered by title.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Live chapters of the selected module ordered by title.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Selected module.
    pub fn selected_module(&self) -> Option<&Module> {
        let id = self.selected_module.as_ref()?;
        self.modules.iter().find(|module| module.id() == id)
    }

    /// Selected chapter.
    pub fn selected_chapter(&self) -> Option<&Chapter> {
        let id = self.selected_chapter.as_ref()?;
        self.chapters.iter().find(|chapter| chapter.id() == id)
    }

    /// `module › chapter`, or just the module title before a chapter is
    /// selected.
    pub fn breadcrumb(&self) -> Option<String> {
        let module = self.selected_module()?;
        Some(match self.selected_chapter() {
            Some(chapter) => format!("{} › {}", module.title(), chapter.title()),
            None => module.title().to_string(),
        })
    }

    /// Player contents for the selected chapter.
    pub fn player(&self) -> Option<PlayerView> {
        let chapter = self.selected_chapter()?;
        Some(PlayerView {
            title: chapter.title().clone(),
            link: chapter.youtube_link().clone(),
            embed_url: chapter.youtube_link().embed_url(),
        })
    }
}
