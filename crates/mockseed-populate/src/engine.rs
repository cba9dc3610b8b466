use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use mockseed_core::{Choice, CompositeRef, PersistenceBackend, Record, SchemaProvider, Value};

use crate::coin::{CoinToss, FairCoin};
use crate::errors::PopulateError;
use crate::model::{PopulateIssue, PopulateOptions, RunReport};
use crate::node::{FieldNode, SchemaNode};
use crate::registry::{HandlerContext, HandlerFn, HandlerRegistry, HandlerSource};
use crate::retry::RetryPolicy;

/// Containers and their composites, after exclusions, in walk order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub containers: Vec<DiscoveredContainer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredContainer {
    pub name: String,
    pub composites: Vec<CompositeRef>,
}

impl Discovery {
    pub fn composites(&self, container: &str) -> &[CompositeRef] {
        self.containers
            .iter()
            .find(|candidate| candidate.name == container)
            .map(|candidate| candidate.composites.as_slice())
            .unwrap_or(&[])
    }

    pub fn composite_count(&self) -> usize {
        self.containers
            .iter()
            .map(|container| container.composites.len())
            .sum()
    }

    pub fn iter_composites(&self) -> impl Iterator<Item = &CompositeRef> {
        self.containers
            .iter()
            .flat_map(|container| container.composites.iter())
    }
}

/// Walks configured containers and persists random records for every
/// composite, all inside one transaction.
pub struct PopulationEngine {
    options: PopulateOptions,
    registry: HandlerRegistry,
    coin: Box<dyn CoinToss>,
    run_id: Option<String>,
}

impl PopulationEngine {
    pub fn new(options: PopulateOptions, registry: HandlerRegistry) -> Self {
        Self {
            options,
            registry,
            coin: Box::new(FairCoin),
            run_id: None,
        }
    }

    /// Replace the coin used for optional fields.
    pub fn with_coin(mut self, coin: impl CoinToss + 'static) -> Self {
        self.coin = Box::new(coin);
        self
    }

    /// Use a caller-chosen run id instead of a fresh one.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Resolve the configured containers to their composites, dropping
    /// excluded ones.
    pub fn discover(&self, provider: &dyn SchemaProvider) -> Result<Discovery, PopulateError> {
        let excluded = self.options.excluded_set();
        let mut containers = Vec::with_capacity(self.options.containers.len());
        for name in &self.options.containers {
            let composites = provider.composites(name, &excluded)?;
            containers.push(DiscoveredContainer {
                name: name.clone(),
                composites,
            });
        }
        Ok(Discovery { containers })
    }

    /// Populate every configured container `cycles` times.
    ///
    /// Any error or panic during the walk rolls back every write of the run.
    pub fn run(
        &mut self,
        provider: &dyn SchemaProvider,
        backend: &mut dyn PersistenceBackend,
    ) -> Result<RunReport, PopulateError> {
        self.options.validate()?;

        let start = Instant::now();
        let run_id = self
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let seed = self.options.seed.unwrap_or_else(|| rand::rng().random());
        let cycles = self.options.cycles;
        let discovery = self.discover(provider)?;
        let report = RunReport::new(run_id.clone(), seed, cycles, self.options.containers.len());

        info!(
            run_id = %run_id,
            seed,
            cycles,
            containers = discovery.containers.len(),
            composites = discovery.composite_count(),
            coin_toss = self.options.use_coin_toss,
            "population started"
        );

        backend.begin()?;

        let outcome = {
            let walk = Walk {
                provider,
                discovery: &discovery,
                registry: &self.registry,
                backend: &mut *backend,
                coin: self.coin.as_mut(),
                rng: ChaCha8Rng::seed_from_u64(seed),
                retry: RetryPolicy::new(self.options.unique_attempts),
                use_coin_toss: self.options.use_coin_toss,
                cycle: 0,
                report,
            };
            catch_unwind(AssertUnwindSafe(move || walk.run(cycles)))
        };

        let failure = match outcome {
            Ok(Ok(mut report)) => match backend.commit() {
                Ok(()) => {
                    report.duration_ms = start.elapsed().as_millis() as u64;
                    info!(
                        run_id = %run_id,
                        containers = report.containers,
                        composites_persisted = report.composites_persisted,
                        fields_filled = report.fields_filled,
                        fields_skipped = report.fields_skipped,
                        handler_misses = report.handler_misses,
                        duration_ms = report.duration_ms,
                        "population committed"
                    );
                    return Ok(report);
                }
                Err(err) => PopulateError::from(err),
            },
            Ok(Err(err)) => err,
            Err(panic) => PopulateError::Panicked(panic_message(panic)),
        };

        error!(run_id = %run_id, error = %failure, "population failed; rolling back");
        if let Err(err) = backend.rollback() {
            error!(run_id = %run_id, error = %err, "rollback failed");
        }
        Err(failure)
    }
}

struct Walk<'r> {
    provider: &'r dyn SchemaProvider,
    discovery: &'r Discovery,
    registry: &'r HandlerRegistry,
    backend: &'r mut dyn PersistenceBackend,
    coin: &'r mut dyn CoinToss,
    rng: ChaCha8Rng,
    retry: RetryPolicy,
    use_coin_toss: bool,
    cycle: u32,
    report: RunReport,
}

impl Walk<'_> {
    fn run(mut self, cycles: u32) -> Result<RunReport, PopulateError> {
        let discovery = self.discovery;
        for cycle in 1..=cycles {
            self.cycle = cycle;
            info!(cycle, cycles, "cycle started");
            for container in &discovery.containers {
                self.visit(SchemaNode::Container(&container.name))?;
            }
        }
        Ok(self.report)
    }

    fn visit(&mut self, node: SchemaNode<'_>) -> Result<(), PopulateError> {
        debug!(
            container = node.container(),
            node = %node,
            kind = ?node.kind(),
            cycle = self.cycle,
            "visit"
        );
        match node {
            SchemaNode::Container(name) => self.visit_container(name),
            SchemaNode::Composite(composite) => self.visit_composite(composite),
            SchemaNode::ScalarField { node, instance } => self.visit_scalar(node, instance),
            SchemaNode::MultiRelationField { node, instance } => {
                self.visit_multi_relation(node, instance)
            }
        }
    }

    fn visit_container(&mut self, name: &str) -> Result<(), PopulateError> {
        let discovery = self.discovery;
        for composite in discovery.composites(name) {
            self.visit(SchemaNode::Composite(composite))?;
        }
        Ok(())
    }

    fn visit_composite(&mut self, composite: &CompositeRef) -> Result<(), PopulateError> {
        let mut instance = self.backend.construct(composite)?;

        let fields = self.provider.fields(composite)?;
        for field in fields.iter().filter(|field| !field.is_system()) {
            self.visit(SchemaNode::ScalarField {
                node: FieldNode::new(composite, field),
                instance: &mut instance,
            })?;
        }

        let id = self.backend.persist(&mut instance)?;
        self.report.record_persisted();
        debug!(composite = %composite, id = %id, "composite persisted");

        let multi_valued = self.provider.multi_valued_fields(composite)?;
        for field in &multi_valued {
            self.visit(SchemaNode::MultiRelationField {
                node: FieldNode::new(composite, field),
                instance: &mut instance,
            })?;
        }
        Ok(())
    }

    fn visit_scalar(
        &mut self,
        node: FieldNode<'_>,
        instance: &mut Record,
    ) -> Result<(), PopulateError> {
        let field = node.field;
        if field.blank && self.use_coin_toss && self.coin.skip(&mut self.rng) {
            self.report.record_skipped();
            debug!(field = %node.path(), "optional field skipped");
            return Ok(());
        }

        let registry = self.registry;
        let Some(generator) = FieldGenerator::resolve(registry, &node) else {
            self.record_handler_miss(&node);
            return Ok(());
        };

        let value = if field.unique {
            self.generate_unique(&generator, node)?
        } else {
            generator.generate(node, &*self.backend, &mut self.rng)?
        };

        if value.is_null() && field.relation.is_some() {
            self.report.record_issue(
                PopulateIssue::info(
                    "related_empty",
                    node.path(),
                    "no related records; value left null",
                )
                .in_cycle(self.cycle),
            );
        }

        self.backend.set_attribute(instance, &field.name, value)?;
        self.report.record_filled(&generator.label(&node));
        Ok(())
    }

    fn visit_multi_relation(
        &mut self,
        node: FieldNode<'_>,
        instance: &mut Record,
    ) -> Result<(), PopulateError> {
        let registry = self.registry;
        let Some(generator) = FieldGenerator::resolve(registry, &node) else {
            self.record_handler_miss(&node);
            return Ok(());
        };

        let ids = match generator.generate(node, &*self.backend, &mut self.rng)? {
            Value::Refs(ids) => ids,
            Value::Ref(id) => vec![id],
            Value::Null => Vec::new(),
            other => {
                return Err(PopulateError::handler(
                    node.path(),
                    format!("expected related record ids, got {}", other.type_name()),
                ));
            }
        };

        if ids.is_empty() {
            self.report.record_issue(
                PopulateIssue::info("related_empty", node.path(), "no related records to add")
                    .in_cycle(self.cycle),
            );
        } else {
            self.backend
                .add_to_relation(instance, &node.field.name, &ids)?;
        }
        self.report.record_filled(&generator.label(&node));
        Ok(())
    }

    fn generate_unique(
        &mut self,
        generator: &FieldGenerator<'_>,
        node: FieldNode<'_>,
    ) -> Result<Value, PopulateError> {
        let backend: &dyn PersistenceBackend = &*self.backend;
        let rng = &mut self.rng;
        let outcome = self.retry.resolve(
            || generator.generate(node, backend, &mut *rng),
            |candidate| {
                Ok(backend.exists_with_value(node.composite, &node.field.name, candidate)?)
            },
        )?;

        let attempts = outcome.attempts();
        self.report.record_unique_retries(attempts.saturating_sub(1));
        if outcome.is_exhausted() {
            let path = node.path();
            warn!(field = %path, attempts, "unique value still collides; accepting last candidate");
            self.report.record_unique_exhausted(
                PopulateIssue::warning(
                    "unique_exhausted",
                    path,
                    format!("value still collides after {attempts} attempts"),
                )
                .in_cycle(self.cycle),
            );
        }
        Ok(outcome.into_value())
    }

    fn record_handler_miss(&mut self, node: &FieldNode<'_>) {
        let path = node.path();
        warn!(field = %path, kind = %node.field.kind, "handler not found; field left unset");
        self.report.record_handler_miss(
            PopulateIssue::warning(
                "handler_not_found",
                path,
                format!("no handler for kind {}", node.field.kind),
            )
            .in_cycle(self.cycle),
        );
    }
}

/// Source of a field's value: its declared choices or a registry handler.
enum FieldGenerator<'a> {
    Choices(&'a [Choice]),
    Handler {
        source: HandlerSource,
        handler: &'a HandlerFn,
    },
}

impl<'a> FieldGenerator<'a> {
    /// Declared choices win over any registered handler.
    fn resolve(registry: &'a HandlerRegistry, node: &FieldNode<'a>) -> Option<Self> {
        if node.field.has_choices() {
            return Some(FieldGenerator::Choices(&node.field.choices));
        }
        registry
            .lookup(node, false)
            .map(|(source, handler)| FieldGenerator::Handler { source, handler })
    }

    fn label(&self, node: &FieldNode<'_>) -> String {
        match self {
            FieldGenerator::Choices(_) => "choices".to_string(),
            FieldGenerator::Handler { source, .. } => source.label(node),
        }
    }

    fn generate(
        &self,
        node: FieldNode<'_>,
        store: &dyn PersistenceBackend,
        rng: &mut dyn RngCore,
    ) -> Result<Value, PopulateError> {
        match self {
            FieldGenerator::Choices(choices) => choices
                .choose(rng)
                .map(|choice| Value::from_json(&choice.value))
                .ok_or_else(|| PopulateError::handler(node.path(), "choice set is empty")),
            FieldGenerator::Handler { handler, .. } => {
                let mut ctx = HandlerContext::new(node, store, rng);
                handler(&mut ctx)
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "population panicked".to_string()
    }
}
