//! Interceptor chains around extensible component operations.
//!
//! A chain wraps one operation of one component kind. Hooks are installed
//! in load order and compose like nested wrappers: the hook installed last
//! is the outermost, so pre-hooks run newest first, then the base
//! operation, then post-hooks oldest first. A hook can never skip the base
//! operation or the hooks installed before it.

use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;

/// Pre/post processing around an operation.
pub trait Interceptor<A, R>: Send + Sync {
    /// Inspect or normalise the arguments before inner layers see them.
    fn before(&self, _args: &mut A) {}

    /// Inspect the result, update auxiliary state or emit further events.
    fn after(&self, _args: &A, _result: &mut R) {}
}

/// Interceptor built from closures.
pub struct FnInterceptor<A, R> {
    before: Option<Box<dyn Fn(&mut A) + Send + Sync>>,
    after: Option<Box<dyn Fn(&A, &mut R) + Send + Sync>>,
}

impl<A, R> FnInterceptor<A, R> {
    pub fn new() -> Self {
        Self {
            before: None,
            after: None,
        }
    }

    pub fn before(mut self, f: impl Fn(&mut A) + Send + Sync + 'static) -> Self {
        self.before = Some(Box::new(f));
        self
    }

    pub fn after(mut self, f: impl Fn(&A, &mut R) + Send + Sync + 'static) -> Self {
        self.after = Some(Box::new(f));
        self
    }
}

impl<A, R> Interceptor<A, R> for FnInterceptor<A, R>
where
    A: Send + Sync,
    R: Send + Sync,
{
    fn before(&self, args: &mut A) {
        if let Some(f) = &self.before {
            f(args);
        }
    }

    fn after(&self, args: &A, result: &mut R) {
        if let Some(f) = &self.after {
            f(args, result);
        }
    }
}

struct Installed<A, R> {
    module: String,
    hook: Arc<dyn Interceptor<A, R>>,
}

/// Ordered hooks for one (component kind, operation) pair.
pub struct InterceptorChain<A, R> {
    component: String,
    operation: String,
    hooks: RwLock<Vec<Installed<A, R>>>,
}

impl<A, R> InterceptorChain<A, R>
where
    A: Clone + Send,
    R: Send,
{
    pub fn new(component: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            operation: operation.into(),
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Install `hook` for `module` as the new outermost layer.
    ///
    /// A module owns at most one hook per chain; a second install by the
    /// same module is ignored and returns `false`.
    pub fn install(&self, module: &str, hook: Arc<dyn Interceptor<A, R>>) -> bool {
        let mut hooks = self.hooks.write();
        if hooks.iter().any(|h| h.module == module) {
            tracing::debug!(
                component = %self.component,
                operation = %self.operation,
                module,
                "Interceptor already installed"
            );
            return false;
        }
        hooks.push(Installed {
            module: module.to_string(),
            hook,
        });
        tracing::debug!(
            component = %self.component,
            operation = %self.operation,
            module,
            depth = hooks.len(),
            "Interceptor installed"
        );
        true
    }

    /// Modules with a hook installed, innermost first.
    pub fn modules(&self) -> Vec<String> {
        self.hooks.read().iter().map(|h| h.module.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn Interceptor<A, R>>> {
        self.hooks.read().iter().map(|h| h.hook.clone()).collect()
    }

    /// Run an async base operation through the chain.
    pub async fn run<F, Fut>(&self, mut args: A, base: F) -> R
    where
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = R>,
    {
        let hooks = self.snapshot();
        for hook in hooks.iter().rev() {
            hook.before(&mut args);
        }
        let mut result = base(args.clone()).await;
        for hook in hooks.iter() {
            hook.after(&args, &mut result);
        }
        result
    }

    /// Run a synchronous base operation through the chain.
    pub fn run_sync<F>(&self, mut args: A, base: F) -> R
    where
        F: FnOnce(A) -> R,
    {
        let hooks = self.snapshot();
        for hook in hooks.iter().rev() {
            hook.before(&mut args);
        }
        let mut result = base(args.clone());
        for hook in hooks.iter() {
            hook.after(&args, &mut result);
        }
        result
    }
}

impl<A, R> std::fmt::Debug for InterceptorChain<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let modules: Vec<String> = self.hooks.read().iter().map(|h| h.module.clone()).collect();
        f.debug_struct("InterceptorChain")
            .field("component", &self.component)
            .field("operation", &self.operation)
            .field("modules", &modules)
            .finish()
    }
}
