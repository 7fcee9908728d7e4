//! Multi-page project state for a single editing session.
//!
//! A [`Project`] always holds at least one [`Page`] and exactly one of them
//! is active. Send-message and save act on the active page only.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::{ChatTurn, Transcript};
use crate::error::CoreError;
use crate::types::{DbId, PageId};

/// Name of the page every new project starts with.
pub const DEFAULT_PAGE_NAME: &str = "Home";

/// Maximum length of a page name in characters.
pub const MAX_PAGE_NAME_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// One page of a site project: its transcript and latest generated output.
///
/// `site_id` links the page to its persisted site after the first save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPage")]
pub struct Page {
    pub id: PageId,
    pub name: String,
    #[serde(rename = "chat")]
    pub transcript: Transcript,
    pub html: String,
    pub css: String,
    pub site_id: Option<DbId>,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    id: Option<PageId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    chat: Transcript,
    #[serde(default)]
    html: String,
    #[serde(default)]
    css: String,
    #[serde(default)]
    site_id: Option<DbId>,
}

impl TryFrom<RawPage> for Page {
    type Error = CoreError;

    fn try_from(raw: RawPage) -> Result<Self, Self::Error> {
        let name = match raw.name {
            Some(name) => validate_page_name(&name)?,
            None => DEFAULT_PAGE_NAME.to_string(),
        };
        Ok(Self {
            id: raw.id.unwrap_or_else(Uuid::new_v4),
            name,
            transcript: raw.chat,
            html: raw.html,
            css: raw.css,
            site_id: raw.site_id,
        })
    }
}

impl Page {
    /// A fresh, empty page with a locally generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            transcript: Transcript::new(),
            html: String::new(),
            css: String::new(),
            site_id: None,
        }
    }
}

/// Trim and validate a page name.
pub fn validate_page_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Page name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_PAGE_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Page name exceeds maximum length of {MAX_PAGE_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// In-memory registry of pages with an active-page pointer.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pages: Vec<Page>,
    #[serde(rename = "active_page_id")]
    active: PageId,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// A project with a single active `Home` page.
    pub fn new() -> Self {
        let home = Page::new(DEFAULT_PAGE_NAME);
        let active = home.id;
        Self {
            pages: vec![home],
            active,
        }
    }

    /// Rebuild a one-page project from a persisted site and its chat turns,
    /// so reopening a saved site replays the same transcript and output.
    pub fn from_site(
        site_id: DbId,
        name: &str,
        html: String,
        css: String,
        turns: Vec<ChatTurn>,
    ) -> Self {
        let name = validate_page_name(name).unwrap_or_else(|_| DEFAULT_PAGE_NAME.to_string());
        let page = Page {
            id: Uuid::new_v4(),
            name,
            transcript: Transcript::from_turns(turns),
            html,
            css,
            site_id: Some(site_id),
        };
        let active = page.id;
        Self {
            pages: vec![page],
            active,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Always false: a project never drops below one page.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn active_page_id(&self) -> PageId {
        self.active
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    pub fn active_page(&self) -> &Page {
        self.page(self.active).unwrap_or(&self.pages[0])
    }

    pub fn active_page_mut(&mut self) -> &mut Page {
        let idx = self
            .pages
            .iter()
            .position(|p| p.id == self.active)
            .unwrap_or(0);
        &mut self.pages[idx]
    }

    /// Append a new empty page named `Page N` and make it active.
    pub fn add_page(&mut self) -> &Page {
        let page = Page::new(format!("Page {}", self.pages.len() + 1));
        self.active = page.id;
        self.pages.push(page);
        &self.pages[self.pages.len() - 1]
    }

    /// Rename a page. No persistence side effect until the next save.
    pub fn rename_page(&mut self, id: PageId, name: &str) -> Result<&Page, CoreError> {
        let name = validate_page_name(name)?;
        let page = self.page_mut(id).ok_or(CoreError::PageNotFound(id))?;
        page.name = name;
        Ok(page)
    }

    /// Remove a page.
    ///
    /// Deleting the last remaining page is a silent no-op. If the active
    /// page is removed, the first remaining page becomes active.
    pub fn delete_page(&mut self, id: PageId) -> Result<(), CoreError> {
        let idx = self
            .pages
            .iter()
            .position(|p| p.id == id)
            .ok_or(CoreError::PageNotFound(id))?;
        if self.pages.len() == 1 {
            return Ok(());
        }
        self.pages.remove(idx);
        if self.active == id {
            self.active = self.pages[0].id;
        }
        Ok(())
    }

    /// Make `id` the active page.
    pub fn select_page(&mut self, id: PageId) -> Result<&Page, CoreError> {
        let idx = self
            .pages
            .iter()
            .position(|p| p.id == id)
            .ok_or(CoreError::PageNotFound(id))?;
        self.active = id;
        Ok(&self.pages[idx])
    }
}
