use std::collections::HashMap;

use log::{debug, warn};
use serde_json::{Map, Value};

use bc_workflow_api::{PageData, RunWorkflowRequest};

use crate::schema::Input;
use crate::traits::WorkflowClient;

/// Monotonic fetch generation for one form. A response carrying a stale
/// generation is discarded instead of overwriting newer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Search state for one form id.
#[derive(Debug, Clone, Default)]
pub struct FormSearchState {
    pub datasearch: Option<PageData<Value>>,
    pub is_fetching: bool,
    pub txfo_search: Option<Value>,
    pub ismodify: bool,
    pub searchtext: String,
    pub advancedsearch: HashMap<String, String>,
    pub global_advanced_search: Option<Value>,
    pub store_form_search: Vec<Value>,
    pub store_info_search: Option<Value>,
    pub fetch_control_default_value: bool,
    generation: u64,
}

/// Explicit map of form id to search state, owned by one coordinator and
/// passed by reference to whoever needs it. Entries are created lazily on
/// first access and removed wholesale when a tab closes; forms never see
/// each other's state.
#[derive(Debug, Default)]
pub struct FormSearchStore {
    forms: HashMap<String, FormSearchState>,
}

impl FormSearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the default state only if absent. Idempotent.
    pub fn init_form(&mut self, form_id: &str) {
        self.forms.entry(form_id.to_string()).or_default();
    }

    pub fn state(&self, form_id: &str) -> Option<&FormSearchState> {
        self.forms.get(form_id)
    }

    pub fn state_mut(&mut self, form_id: &str) -> &mut FormSearchState {
        self.forms.entry(form_id.to_string()).or_default()
    }

    /// Removes the form's state entirely, not just resets it.
    pub fn clear_form(&mut self, form_id: &str) {
        self.forms.remove(form_id);
    }

    pub fn set_search_text(&mut self, form_id: &str, text: &str) {
        self.state_mut(form_id).searchtext = text.to_string();
    }

    /// Replaces the advanced-search filter object wholesale.
    pub fn set_advanced_search(&mut self, form_id: &str, filters: HashMap<String, String>) {
        self.state_mut(form_id).advancedsearch = filters;
    }

    /// On-blur policy for advanced-search inputs: only fields flagged
    /// `isSearch` participate; a trimmed non-empty value is stored, a
    /// cleared one removes its key.
    pub fn update_advanced_search_field(&mut self, form_id: &str, input: &Input, raw: &str) {
        if input.config.is_search != Some(true) {
            return;
        }
        let key = input.field_key().to_string();
        let state = self.state_mut(form_id);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            state.advancedsearch.remove(&key);
        } else {
            state.advancedsearch.insert(key, trimmed.to_string());
        }
    }

    pub fn set_global_advanced_search(&mut self, form_id: &str, filters: Option<Value>) {
        self.state_mut(form_id).global_advanced_search = filters;
    }

    pub fn set_datasearch(&mut self, form_id: &str, page: Option<PageData<Value>>) {
        self.state_mut(form_id).datasearch = page;
    }

    pub fn set_is_fetching(&mut self, form_id: &str, fetching: bool) {
        self.state_mut(form_id).is_fetching = fetching;
    }

    pub fn set_is_modify(&mut self, form_id: &str, modified: bool) {
        self.state_mut(form_id).ismodify = modified;
    }

    /// Marks a fetch in flight and hands back its generation token.
    pub fn begin_fetch(&mut self, form_id: &str) -> Generation {
        let state = self.state_mut(form_id);
        state.generation += 1;
        state.is_fetching = true;
        Generation(state.generation)
    }

    /// Applies a completed search only when its generation is still the
    /// newest for the form. Returns whether the result was applied.
    pub fn apply_search_result(
        &mut self,
        form_id: &str,
        generation: Generation,
        page: Option<PageData<Value>>,
    ) -> bool {
        let Some(state) = self.forms.get_mut(form_id) else {
            debug!("search result for cleared form '{form_id}' dropped");
            return false;
        };
        if state.generation != generation.0 {
            debug!("stale search response for form '{form_id}' discarded");
            return false;
        }
        state.datasearch = page;
        state.is_fetching = false;
        true
    }
}

/// Issues one backend search for a form: the advanced filters and free-text
/// search merged with pagination, `is_fetching` held for the call's
/// duration, the response applied only if no newer search started
/// meanwhile. A backend failure surfaces as `None` for the caller's error
/// panel; this path never panics.
#[allow(clippy::too_many_arguments)]
pub fn run_search(
    store: &mut FormSearchStore,
    client: &dyn WorkflowClient,
    session_token: &str,
    workflow_id: &str,
    commandname: &str,
    form_id: &str,
    page_index: u32,
    page_size: u32,
) -> Option<PageData<Value>> {
    let generation = store.begin_fetch(form_id);

    let mut parameters = Map::new();
    {
        let state = store.state_mut(form_id);
        for (key, value) in &state.advancedsearch {
            parameters.insert(key.clone(), Value::String(value.clone()));
        }
        let searchtext = state.searchtext.trim();
        if !searchtext.is_empty() {
            parameters.insert(
                "searchtext".to_string(),
                Value::String(searchtext.to_string()),
            );
        }
    }

    let request = RunWorkflowRequest::new(session_token, workflow_id, commandname, parameters)
        .search(page_index, page_size);

    let page = match client.run_workflow(&request) {
        Ok(envelope) if envelope.is_valid() => Some(PageData::from_normalized(
            &envelope.normalize(),
            page_index,
            page_size,
        )),
        Ok(envelope) => {
            match envelope.normalize().error_info {
                Some(err) => warn!(
                    "search workflow {workflow_id} failed: {} (execute_id {})",
                    err.info, err.execute_id
                ),
                None => warn!("search workflow {workflow_id} returned an invalid envelope"),
            }
            None
        }
        Err(err) => {
            warn!("search workflow {workflow_id} call failed: {err}");
            None
        }
    };

    if store.apply_search_result(form_id, generation, page.clone()) {
        page
    } else {
        None
    }
}
