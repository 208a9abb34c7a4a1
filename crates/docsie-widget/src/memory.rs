//! In-memory host document
//!
//! Models just enough of a page for the bootstrap: head and body element
//! lists, named containers with children and attributes, the page URL with
//! a replace-only history, and an optional widget global with a cleanup hook.
//! Script outcomes are not simulated; callers fire them explicitly with
//! [`MemoryHost::fire_load`] / [`MemoryHost::fire_error`], which lets tests
//! reproduce late callbacks from superseded sessions.

use std::collections::{BTreeMap, HashMap};

use url::Url;

use crate::error::HostError;
use crate::host::{Host, NodeId, ScriptSpec};
use crate::signal::LoadSignal;

/// Behaviour of the widget global's `cleanup()` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupHook {
    Succeeds,
    Fails(String),
}

/// An element in the head or body.
#[derive(Debug, Clone)]
pub struct MemoryElement {
    pub id: NodeId,
    pub tag: &'static str,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Container {
    children: Vec<String>,
    attributes: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct MemoryHost {
    url: Url,
    history: Vec<Url>,
    has_head: bool,
    has_body: bool,
    head: Vec<MemoryElement>,
    body: Vec<MemoryElement>,
    containers: HashMap<String, Container>,
    signals: HashMap<NodeId, LoadSignal>,
    cleanup_hook: Option<CleanupHook>,
    cleanup_calls: usize,
    next_node: u64,
}

impl MemoryHost {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            history: Vec::new(),
            has_head: true,
            has_body: true,
            head: Vec::new(),
            body: Vec::new(),
            containers: HashMap::new(),
            signals: HashMap::new(),
            cleanup_hook: None,
            cleanup_calls: 0,
            next_node: 1,
        }
    }

    /// Parse `url` and build a host for it.
    pub fn at(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(url)?))
    }

    /// Add an empty container element.
    pub fn with_container(mut self, id: &str) -> Self {
        self.containers.entry(id.to_owned()).or_default();
        self
    }

    /// Install a widget global whose `cleanup()` behaves as given.
    pub fn with_cleanup_hook(mut self, hook: CleanupHook) -> Self {
        self.cleanup_hook = Some(hook);
        self
    }

    /// Simulate a document without `<head>`, so stylesheet injection fails.
    pub fn without_head(mut self) -> Self {
        self.has_head = false;
        self
    }

    /// Simulate a document without `<body>`, so script injection fails.
    pub fn without_body(mut self) -> Self {
        self.has_body = false;
        self
    }

    /// Append rendered content to a container, as the widget would.
    pub fn render_into(&mut self, container_id: &str, html: &str) {
        self.containers
            .entry(container_id.to_owned())
            .or_default()
            .children
            .push(html.to_owned());
    }

    pub fn container_children(&self, container_id: &str) -> Option<&[String]> {
        self.containers
            .get(container_id)
            .map(|c| c.children.as_slice())
    }

    pub fn container_attribute(&self, container_id: &str, name: &str) -> Option<&str> {
        self.containers
            .get(container_id)?
            .attributes
            .get(name)
            .map(String::as_str)
    }

    pub fn stylesheets(&self) -> impl Iterator<Item = &MemoryElement> {
        self.head.iter().filter(|e| e.tag == "link")
    }

    pub fn scripts(&self) -> impl Iterator<Item = &MemoryElement> {
        self.body.iter().filter(|e| e.tag == "script")
    }

    pub fn element(&self, node: NodeId) -> Option<&MemoryElement> {
        self.head.iter().chain(self.body.iter()).find(|e| e.id == node)
    }

    /// Signal handed over with the script `node`, if any.
    pub fn signal(&self, node: NodeId) -> Option<&LoadSignal> {
        self.signals.get(&node)
    }

    /// Fire the script's `load` event. Returns whether the outcome was delivered.
    pub fn fire_load(&self, node: NodeId) -> bool {
        self.signals.get(&node).is_some_and(LoadSignal::loaded)
    }

    /// Fire the script's `error` event. Returns whether the outcome was delivered.
    pub fn fire_error(&self, node: NodeId, reason: &str) -> bool {
        self.signals
            .get(&node)
            .is_some_and(|signal| signal.failed(reason))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URLs replaced so far, oldest first (the entries that were overwritten).
    pub fn replaced_history(&self) -> &[Url] {
        &self.history
    }

    pub fn cleanup_calls(&self) -> usize {
        self.cleanup_calls
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }
}

impl Host for MemoryHost {
    fn append_stylesheet(&mut self, href: &str) -> Result<NodeId, HostError> {
        if !self.has_head {
            return Err(HostError::MissingElement("head"));
        }
        let id = self.allocate();
        let attributes = BTreeMap::from([
            ("rel".to_owned(), "stylesheet".to_owned()),
            ("media".to_owned(), "all".to_owned()),
            ("href".to_owned(), href.to_owned()),
        ]);
        self.head.push(MemoryElement {
            id,
            tag: "link",
            attributes,
        });
        Ok(id)
    }

    fn append_script(&mut self, spec: ScriptSpec) -> Result<NodeId, HostError> {
        if !self.has_body {
            return Err(HostError::MissingElement("body"));
        }
        let id = self.allocate();
        let (name, value) = spec.config_attribute;
        let mut attributes = BTreeMap::from([
            ("type".to_owned(), "text/javascript".to_owned()),
            ("src".to_owned(), spec.src),
            (name, value),
        ]);
        if spec.is_async {
            attributes.insert("async".to_owned(), String::new());
        }
        self.body.push(MemoryElement {
            id,
            tag: "script",
            attributes,
        });
        self.signals.insert(id, spec.signal);
        Ok(id)
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    fn remove_node(&mut self, node: NodeId) {
        self.head.retain(|e| e.id != node);
        self.body.retain(|e| e.id != node);
    }

    fn clear_container(&mut self, container_id: &str) {
        if let Some(container) = self.containers.get_mut(container_id) {
            container.children.clear();
        }
    }

    fn mark_widget_root(&mut self, container_id: &str) -> bool {
        match self.containers.get_mut(container_id) {
            Some(container) => {
                container
                    .attributes
                    .insert(docsie_auth::ROOT_ATTRIBUTE.to_owned(), String::new());
                true
            }
            None => false,
        }
    }

    fn current_url(&self) -> Url {
        self.url.clone()
    }

    fn replace_url(&mut self, url: &Url) -> Result<(), HostError> {
        if url.origin() != self.url.origin() {
            return Err(HostError::Navigation(format!(
                "cannot replace {} with cross-origin {url}",
                self.url
            )));
        }
        let previous = std::mem::replace(&mut self.url, url.clone());
        self.history.push(previous);
        Ok(())
    }

    fn invoke_widget_cleanup(&mut self) -> Result<bool, HostError> {
        match &self.cleanup_hook {
            None => Ok(false),
            Some(hook) => {
                self.cleanup_calls += 1;
                match hook {
                    CleanupHook::Succeeds => Ok(true),
                    CleanupHook::Fails(reason) => Err(HostError::CleanupHook(reason.clone())),
                }
            }
        }
    }
}
