//! Host document abstraction
//!
//! Decouples the bootstrap from the concrete document it mutates. A browser
//! build implements this over `document`/`window`; [`crate::MemoryHost`]
//! implements it in memory. All calls are synchronous; only the script's load
//! outcome arrives later, through the [`LoadSignal`] carried by [`ScriptSpec`].

use url::Url;

use crate::error::HostError;
use crate::signal::LoadSignal;

/// Handle to an element the host inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Script element to inject.
#[derive(Debug, Clone)]
pub struct ScriptSpec {
    pub src: String,
    /// Load asynchronously without blocking parsing
    pub is_async: bool,
    /// Name and value of the configuration attribute (`data-docsie`)
    pub config_attribute: (String, String),
    /// Where the host reports `load` / `error`
    pub signal: LoadSignal,
}

/// Document operations needed to mount and unmount the widget.
pub trait Host {
    /// Append a `<link rel="stylesheet" media="all">` to the document head.
    fn append_stylesheet(&mut self, href: &str) -> Result<NodeId, HostError>;

    /// Append a `<script type="text/javascript">` to the document body.
    ///
    /// The host must call `spec.signal.loaded()` or `spec.signal.failed(..)`
    /// when the script finishes; it may do so before this method returns.
    fn append_script(&mut self, spec: ScriptSpec) -> Result<NodeId, HostError>;

    /// Whether `node` is still attached to the document.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Detach `node`. Detaching a node that is not attached is a no-op.
    fn remove_node(&mut self, node: NodeId);

    /// Remove all children of the container, if it exists.
    fn clear_container(&mut self, container_id: &str);

    /// Mark the container as the widget's render root. Returns false when the
    /// container does not exist.
    fn mark_widget_root(&mut self, container_id: &str) -> bool;

    /// Current page URL.
    fn current_url(&self) -> Url;

    /// Replace the current history entry without reloading the page.
    fn replace_url(&mut self, url: &Url) -> Result<(), HostError>;

    /// Call the widget global's `cleanup()` if the widget installed one.
    ///
    /// `Ok(false)` when there is no global or no hook.
    fn invoke_widget_cleanup(&mut self) -> Result<bool, HostError>;
}
