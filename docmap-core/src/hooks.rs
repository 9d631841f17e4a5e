//! Lifecycle hooks and the per-model-type hook registry.
//!
//! A model installs its behavior once, at first use, by populating a
//! [`Hooks`] value in [`Model::install`](crate::model::Model::install):
//! ordered handler lists for the five lifecycle points, a list of
//! validators, and a table of named template renderers. Handlers run
//! synchronously in registration order; a handler error propagates to the
//! caller unmodified, since hooks run application-supplied code.
//!
//! The registry is keyed by model type identity, so hooks on unrelated
//! models never interact.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Mutex, OnceLock, PoisonError},
};

use async_trait::async_trait;
use bson::Document;

use crate::{error::DocmapResult, model::Model, record::Record, store::DocumentStore};

/// The five lifecycle extension points. Validation is its own channel, see
/// [`Hooks::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    /// After a record is constructed, from values or from a raw document.
    AfterInitialize,
    /// Before a save builds the document to persist.
    BeforeSave,
    /// After the store acknowledged a save.
    AfterSave,
    /// Before a destroy issues the delete.
    BeforeDestroy,
    /// After the delete was issued.
    AfterDestroy,
}

type HookFn<M> = Box<dyn Fn(&mut Record<M>) -> DocmapResult<()> + Send + Sync>;
type RendererFn<M> = Box<dyn Fn(&Record<M>, Option<&Document>) -> Document + Send + Sync>;

/// A validation step for records of model `M`.
///
/// Validators receive the store handle so rules like uniqueness can issue
/// their own lookups. They signal failure by mutating the record's error
/// collection, never through the return value; `Err` is reserved for
/// store or serialization faults.
#[async_trait]
pub trait Validator<M: Model>: Send + Sync {
    async fn validate(
        &self,
        record: &mut Record<M>,
        store: &dyn DocumentStore,
    ) -> DocmapResult<()>;
}

struct FnValidator<F>(F);

#[async_trait]
impl<M, F> Validator<M> for FnValidator<F>
where
    M: Model,
    F: Fn(&mut Record<M>) -> DocmapResult<()> + Send + Sync,
{
    async fn validate(
        &self,
        record: &mut Record<M>,
        _store: &dyn DocumentStore,
    ) -> DocmapResult<()> {
        (self.0)(record)
    }
}

/// The hook pipeline for one model type.
pub struct Hooks<M: Model> {
    after_initialize: Vec<HookFn<M>>,
    before_save: Vec<HookFn<M>>,
    after_save: Vec<HookFn<M>>,
    before_destroy: Vec<HookFn<M>>,
    after_destroy: Vec<HookFn<M>>,
    validators: Vec<Box<dyn Validator<M>>>,
    renderers: HashMap<String, RendererFn<M>>,
}

impl<M: Model> Hooks<M> {
    fn new() -> Self {
        Self {
            after_initialize: Vec::new(),
            before_save: Vec::new(),
            after_save: Vec::new(),
            before_destroy: Vec::new(),
            after_destroy: Vec::new(),
            validators: Vec::new(),
            renderers: HashMap::new(),
        }
    }

    /// Registers a handler to run after construction.
    pub fn after_initialize<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Record<M>) -> DocmapResult<()> + Send + Sync + 'static,
    {
        self.after_initialize.push(Box::new(handler));
        self
    }

    /// Registers a handler to run before each save.
    pub fn before_save<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Record<M>) -> DocmapResult<()> + Send + Sync + 'static,
    {
        self.before_save.push(Box::new(handler));
        self
    }

    /// Registers a handler to run after each save.
    pub fn after_save<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Record<M>) -> DocmapResult<()> + Send + Sync + 'static,
    {
        self.after_save.push(Box::new(handler));
        self
    }

    /// Registers a handler to run before each destroy.
    pub fn before_destroy<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Record<M>) -> DocmapResult<()> + Send + Sync + 'static,
    {
        self.before_destroy.push(Box::new(handler));
        self
    }

    /// Registers a handler to run after each destroy.
    pub fn after_destroy<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Record<M>) -> DocmapResult<()> + Send + Sync + 'static,
    {
        self.after_destroy.push(Box::new(handler));
        self
    }

    /// Registers a validator. Validators run in registration order on every
    /// validation pass.
    pub fn validate<V>(&mut self, validator: V) -> &mut Self
    where
        V: Validator<M> + 'static,
    {
        self.validators.push(Box::new(validator));
        self
    }

    /// Registers a plain closure as a validator, for rules that need no
    /// store access.
    pub fn validate_fn<F>(&mut self, validator: F) -> &mut Self
    where
        F: Fn(&mut Record<M>) -> DocmapResult<()> + Send + Sync + 'static,
    {
        self.validators.push(Box::new(FnValidator(validator)));
        self
    }

    /// Registers a named template renderer, addressable from
    /// [`Record::template_with`](crate::record::Record::template_with).
    pub fn renderer<F>(&mut self, name: impl Into<String>, renderer: F) -> &mut Self
    where
        F: Fn(&Record<M>, Option<&Document>) -> Document + Send + Sync + 'static,
    {
        self.renderers.insert(name.into(), Box::new(renderer));
        self
    }

    /// Runs every handler registered for `point`, in registration order.
    /// The first handler error aborts the run and propagates.
    pub fn run(&self, point: HookPoint, record: &mut Record<M>) -> DocmapResult<()> {
        let handlers = match point {
            HookPoint::AfterInitialize => &self.after_initialize,
            HookPoint::BeforeSave => &self.before_save,
            HookPoint::AfterSave => &self.after_save,
            HookPoint::BeforeDestroy => &self.before_destroy,
            HookPoint::AfterDestroy => &self.after_destroy,
        };

        for handler in handlers {
            handler(record)?;
        }

        Ok(())
    }

    pub(crate) fn validators(&self) -> &[Box<dyn Validator<M>>] {
        &self.validators
    }

    pub(crate) fn render(
        &self,
        name: &str,
        record: &Record<M>,
        options: Option<&Document>,
    ) -> Option<Document> {
        self.renderers
            .get(name)
            .map(|renderer| renderer(record, options))
    }
}

static HOOKS: OnceLock<Mutex<HashMap<TypeId, &'static (dyn Any + Send + Sync)>>> =
    OnceLock::new();

/// Returns the process-wide hooks for `M`, calling
/// [`Model::install`](crate::model::Model::install) on first use.
pub fn hooks_for<M: Model>() -> &'static Hooks<M> {
    let registry = HOOKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    let entry = guard.entry(TypeId::of::<M>()).or_insert_with(|| {
        let mut hooks = Hooks::new();
        M::install(&mut hooks);
        Box::leak(Box::new(hooks))
    });

    match entry.downcast_ref::<Hooks<M>>() {
        Some(hooks) => hooks,
        // The map is keyed by TypeId, so the entry for M is always a Hooks<M>.
        None => unreachable!("hook registry entry type mismatch"),
    }
}
