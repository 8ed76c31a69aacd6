//! Extension modules.
//!
//! An extension module is shipped by a later release and augments
//! components of earlier releases without touching their definitions. It
//! may intercept a component's extensible operations (see [`chain`]),
//! inject elements into a component's declared slots and attach its own bus
//! listeners. Attachment is best-effort: a module that fails or runs out of
//! time is logged and skipped, and never blocks the rest of the page.
//!
//! A module may declare that it supersedes another module. The superseded
//! module is then never attached, which replaces ad-hoc removal of the
//! other module's output at runtime.

pub mod chain;

pub use chain::{FnInterceptor, Interceptor, InterceptorChain};

use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Default budget for one module's attachment.
pub const DEFAULT_ATTACH_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity and relationships of an extension module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionManifest {
    pub id: String,
    pub version: Version,
    #[serde(default)]
    pub description: String,
    /// Modules this one replaces.
    #[serde(default)]
    pub supersedes: Vec<String>,
}

impl ExtensionManifest {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            description: String::new(),
            supersedes: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn superseding(mut self, module: impl Into<String>) -> Self {
        self.supersedes.push(module.into());
        self
    }
}

/// A unit of augmentation attached against a page context `C`.
#[async_trait]
pub trait ExtensionModule<C: Sync>: Send + Sync {
    fn manifest(&self) -> &ExtensionManifest;

    /// Wait for targets, then install hooks, slots and listeners.
    async fn attach(&self, ctx: &C) -> Result<()>;
}

/// Shared extension module.
pub type DynExtension<C> = Arc<dyn ExtensionModule<C>>;

/// Result of attaching one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttachOutcome {
    Attached,
    AlreadyAttached,
    Superseded { by: String },
    Failed { reason: String },
    TimedOut,
}

impl std::fmt::Display for AttachOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttachOutcome::Attached => write!(f, "attached"),
            AttachOutcome::AlreadyAttached => write!(f, "already attached"),
            AttachOutcome::Superseded { by } => write!(f, "superseded by {by}"),
            AttachOutcome::Failed { reason } => write!(f, "failed: {reason}"),
            AttachOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Outcomes of one attachment pass, in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachReport {
    pub outcomes: Vec<(String, AttachOutcome)>,
}

impl AttachReport {
    pub fn outcome(&self, module: &str) -> Option<&AttachOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == module)
            .map(|(_, outcome)| outcome)
    }

    pub fn attached(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == AttachOutcome::Attached)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Holds extension modules in load order and attaches them to a context.
pub struct ExtensionHost<C: Sync> {
    modules: Vec<DynExtension<C>>,
    attach_timeout: Duration,
    attached: Mutex<HashSet<String>>,
}

impl<C: Sync> ExtensionHost<C> {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_ATTACH_TIMEOUT)
    }

    pub fn with_timeout(attach_timeout: Duration) -> Self {
        Self {
            modules: Vec::new(),
            attach_timeout,
            attached: Mutex::new(HashSet::new()),
        }
    }

    /// Append a module. Load order is registration order; a module with
    /// an id already registered is ignored.
    pub fn register(&mut self, module: DynExtension<C>) -> bool {
        let id = module.manifest().id.clone();
        if self.modules.iter().any(|m| m.manifest().id == id) {
            tracing::warn!(module = %id, "Extension module already registered");
            return false;
        }
        self.modules.push(module);
        true
    }

    pub fn manifests(&self) -> Vec<&ExtensionManifest> {
        self.modules.iter().map(|m| m.manifest()).collect()
    }

    /// Superseded module id mapped to the module that supersedes it.
    pub fn supersessions(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for module in &self.modules {
            let manifest = module.manifest();
            for target in &manifest.supersedes {
                map.insert(target.clone(), manifest.id.clone());
            }
        }
        map
    }

    /// Attach every registered module in order.
    ///
    /// `on_attached` runs after each successful attachment; the page uses
    /// it to advance its reported version.
    pub async fn attach_all<F>(&self, ctx: &C, on_attached: F) -> AttachReport
    where
        F: Fn(&ExtensionManifest),
    {
        let supersessions = self.supersessions();
        let mut report = AttachReport::default();

        for module in &self.modules {
            let manifest = module.manifest();
            let id = manifest.id.clone();

            if let Some(by) = supersessions.get(&id) {
                tracing::info!(module = %id, superseded_by = %by, "Skipping superseded extension");
                report
                    .outcomes
                    .push((id, AttachOutcome::Superseded { by: by.clone() }));
                continue;
            }

            if self.attached.lock().contains(&id) {
                report.outcomes.push((id, AttachOutcome::AlreadyAttached));
                continue;
            }

            let outcome = match tokio::time::timeout(self.attach_timeout, module.attach(ctx)).await {
                Ok(Ok(())) => {
                    self.attached.lock().insert(id.clone());
                    tracing::info!(module = %id, version = %manifest.version, "Extension attached");
                    on_attached(manifest);
                    AttachOutcome::Attached
                }
                Ok(Err(e)) => {
                    tracing::warn!(module = %id, error = %e, "Extension attachment failed");
                    AttachOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
                Err(_) => {
                    tracing::warn!(
                        module = %id,
                        timeout_ms = self.attach_timeout.as_millis() as u64,
                        "Extension attachment timed out"
                    );
                    AttachOutcome::TimedOut
                }
            };
            report.outcomes.push((id, outcome));
        }

        report
    }
}

impl<C: Sync> Default for ExtensionHost<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ReadinessBoard;
    use crate::error::Error;

    struct Page {
        readiness: ReadinessBoard,
        log: Mutex<Vec<String>>,
    }

    struct Probe {
        manifest: ExtensionManifest,
        target: &'static str,
    }

    #[async_trait]
    impl ExtensionModule<Page> for Probe {
        fn manifest(&self) -> &ExtensionManifest {
            &self.manifest
        }

        async fn attach(&self, page: &Page) -> Result<()> {
            page.readiness
                .wait_for(self.target, Duration::from_millis(50))
                .await?;
            page.log.lock().push(self.manifest.id.clone());
            Ok(())
        }
    }

    struct Broken(ExtensionManifest);

    #[async_trait]
    impl ExtensionModule<Page> for Broken {
        fn manifest(&self) -> &ExtensionManifest {
            &self.0
        }

        async fn attach(&self, _page: &Page) -> Result<()> {
            Err(Error::UnknownComponent("ghost".into()))
        }
    }

    fn probe(id: &str, version: &str, target: &'static str) -> DynExtension<Page> {
        Arc::new(Probe {
            manifest: ExtensionManifest::new(id, Version::parse(version).unwrap()),
            target,
        })
    }

    fn page() -> Page {
        let readiness = ReadinessBoard::new();
        readiness.handle("content-viewer").mark_ready();
        Page {
            readiness,
            log: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_target_does_not_block_others() {
        let page = page();
        let mut host = ExtensionHost::new();
        host.register(probe("first", "0.1.1", "content-viewer"));
        host.register(probe("orphan", "0.1.2", "never-mounted"));
        host.register(Arc::new(Broken(ExtensionManifest::new(
            "broken",
            Version::new(0, 1, 2),
        ))));
        host.register(probe("last", "0.1.3", "content-viewer"));

        let versions = Mutex::new(Vec::new());
        let report = host
            .attach_all(&page, |m| versions.lock().push(m.version.to_string()))
            .await;

        assert_eq!(*page.log.lock(), vec!["first", "last"]);
        assert_eq!(report.attached(), vec!["first", "last"]);
        assert!(matches!(report.outcome("orphan"), Some(AttachOutcome::Failed { .. })));
        assert!(matches!(report.outcome("broken"), Some(AttachOutcome::Failed { .. })));
        assert_eq!(*versions.lock(), vec!["0.1.1", "0.1.3"]);
    }

    #[tokio::test]
    async fn test_superseded_module_never_attaches() {
        let page = page();
        let mut host = ExtensionHost::new();
        host.register(probe("html-tab", "0.1.2", "content-viewer"));
        host.register(Arc::new(Probe {
            manifest: ExtensionManifest::new("html-panel", Version::new(0, 1, 3))
                .superseding("html-tab"),
            target: "content-viewer",
        }));

        let report = host.attach_all(&page, |_| {}).await;

        assert_eq!(*page.log.lock(), vec!["html-panel"]);
        assert_eq!(
            report.outcome("html-tab"),
            Some(&AttachOutcome::Superseded {
                by: "html-panel".into()
            })
        );
    }

    #[tokio::test]
    async fn test_second_pass_does_not_reattach() {
        let page = page();
        let mut host = ExtensionHost::new();
        host.register(probe("views", "0.1.1", "content-viewer"));
        assert!(!host.register(probe("views", "0.1.1", "content-viewer")));

        host.attach_all(&page, |_| {}).await;
        let report = host.attach_all(&page, |_| {}).await;

        assert_eq!(page.log.lock().len(), 1);
        assert_eq!(report.outcome("views"), Some(&AttachOutcome::AlreadyAttached));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_budget_is_enforced() {
        struct Slow(ExtensionManifest);

        #[async_trait]
        impl ExtensionModule<Page> for Slow {
            fn manifest(&self) -> &ExtensionManifest {
                &self.0
            }

            async fn attach(&self, _page: &Page) -> Result<()> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let page = page();
        let mut host = ExtensionHost::with_timeout(Duration::from_secs(5));
        host.register(Arc::new(Slow(ExtensionManifest::new("slow", Version::new(0, 1, 1)))));

        let report = host.attach_all(&page, |_| {}).await;
        assert_eq!(report.outcome("slow"), Some(&AttachOutcome::TimedOut));
    }
}
