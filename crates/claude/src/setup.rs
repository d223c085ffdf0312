//! Interactive setup of session key, organization and project
//!
//! The prompting itself is delegated to a [`Prompter`] so the CLI can use a
//! terminal UI while tests script the answers.

use log::info;

use crate::api::{Organization, Project};
use crate::error::{Error, Result};
use crate::sync::{ProjectSync, keys};

/// Instructions shown before asking for the session key
pub const SESSION_KEY_HELP: &str = "Please go to https://claude.ai in your browser and copy your \
session key from the Cookie header.\nYou can find this in your browser's developer tools under \
the Network tab.";

/// Something the user can pick from a list
#[derive(Debug, Clone, Copy)]
pub enum SelectableItem<'a> {
    Organization(&'a Organization),
    Project(&'a Project),
}

impl SelectableItem<'_> {
    pub fn display_name(&self) -> &str {
        match self {
            SelectableItem::Organization(org) => &org.name,
            SelectableItem::Project(project) => &project.name,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SelectableItem::Organization(org) => &org.id,
            SelectableItem::Project(project) => &project.id,
        }
    }
}

/// User interaction needed by [`ProjectSync::setup`]
pub trait Prompter {
    /// Show `help` and read a session key
    fn session_key(&mut self, help: &str) -> anyhow::Result<String>;

    /// Let the user pick one of `items`; returns its index
    fn select(&mut self, prompt: &str, items: &[SelectableItem<'_>]) -> anyhow::Result<usize>;

    /// Tell the user something
    fn notify(&mut self, message: &str);
}

/// How setup ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Session key, organization and project are all configured
    Ready,
    NoOrganizations,
    NoActiveProjects,
}

impl ProjectSync {
    /// Make sure session key, organization and project are configured
    ///
    /// Only missing values are asked for, unless `force` is set. Choosing a
    /// different project drops the tracked document, which belonged to the
    /// previous one.
    pub fn setup(&self, prompter: &mut dyn Prompter, force: bool) -> Result<SetupOutcome> {
        let session = self.api().session();
        if force || !session.is_present() {
            let key = prompter.session_key(SESSION_KEY_HELP)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidConfig("session key must not be empty".to_string()));
            }
            session.replace(key)?;
        }

        let target = self.target();

        if force || !target.has(keys::ORGANIZATION_ID) {
            let orgs = self.api().list_organizations()?;
            if orgs.is_empty() {
                prompter.notify("No organizations found. Please create one at https://claude.ai");
                return Ok(SetupOutcome::NoOrganizations);
            }

            let items: Vec<_> = orgs.iter().map(SelectableItem::Organization).collect();
            let org = choose(prompter, "Select an organization for this project", &items)?;
            // A project belongs to one organization
            if target.get(keys::ORGANIZATION_ID).as_deref() != Some(org.id()) {
                target.delete(keys::PROJECT_ID)?;
            }
            self.select_scope_value(keys::ORGANIZATION_ID, org.id())?;
        }

        if force || !target.has(keys::PROJECT_ID) {
            let organization_id = target
                .get(keys::ORGANIZATION_ID)
                .ok_or_else(|| Error::ConfigIncomplete(vec![keys::ORGANIZATION_ID.to_string()]))?;

            let projects = self.api().list_projects(&organization_id)?;
            let active: Vec<&Project> = projects.iter().filter(|p| p.is_active()).collect();
            if active.is_empty() {
                prompter.notify("No active projects found. Please create one at https://claude.ai");
                return Ok(SetupOutcome::NoActiveProjects);
            }

            let items: Vec<_> = active.into_iter().map(SelectableItem::Project).collect();
            let project = choose(prompter, "Select a project", &items)?;
            self.select_scope_value(keys::PROJECT_ID, project.id())?;
        }

        Ok(SetupOutcome::Ready)
    }

    /// Store a scope key, forgetting the tracked document if the scope moved
    fn select_scope_value(&self, key: &str, value: &str) -> Result<()> {
        let target = self.target();
        if target.get(key).as_deref() == Some(value) {
            return Ok(());
        }
        if target.has(key) {
            info!("Scope changed, forgetting tracked document");
            self.clear_tracked()?;
        }
        target.set(key, value)?;
        Ok(())
    }
}

fn choose<'a>(
    prompter: &mut dyn Prompter,
    prompt: &str,
    items: &[SelectableItem<'a>],
) -> Result<SelectableItem<'a>> {
    let index = prompter.select(prompt, items)?;
    items.get(index).copied().ok_or(Error::InvalidSelection {
        index: index + 1,
        len: items.len(),
    })
}
