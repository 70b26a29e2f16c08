//! Instance pool — bounded set of guest instances for one module.
//!
//! A guest instance is never re-entered: each decision call checks out an
//! instance exclusively and returns it afterwards. At most `max_instances`
//! instances exist at once, idle or checked out; callers beyond that wait
//! for a release.
//! Instances whose call trapped are discarded instead of recycled.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use wasmsched_core::PluginConfig;
use wasmsched_host::SchedEngine;

use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::{CallBudget, GuestInstance};
use crate::module::GuestModule;

/// Configuration for an instance pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Instances created by [`InstancePool::warm_up`].
    pub min_instances: u32,
    /// Upper bound on instances alive at once.
    pub max_instances: u32,
    /// Budget for each instance's initialization calls.
    pub init_budget: CallBudget,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_instances: 1,
            max_instances: 8,
            init_budget: CallBudget::unlimited(),
        }
    }
}

impl PoolConfig {
    pub fn from_plugin_config(config: &PluginConfig) -> anyhow::Result<Self> {
        Ok(Self {
            min_instances: config.pool.min_instances,
            max_instances: config.pool.max_instances,
            init_budget: CallBudget::from_config(config)?,
        })
    }
}

/// Engine plus compiled module; creates instances on demand.
#[derive(Clone)]
pub struct InstanceFactory {
    engine: SchedEngine,
    module: GuestModule,
}

impl InstanceFactory {
    pub fn new(engine: SchedEngine, module: GuestModule) -> Self {
        Self { engine, module }
    }

    pub async fn create_instance(&self, budget: &CallBudget) -> RuntimeResult<GuestInstance> {
        GuestInstance::new(&self.engine, &self.module, budget).await
    }

    pub fn module(&self) -> &GuestModule {
        &self.module
    }
}

/// Bounded pool of [`GuestInstance`]s for a single guest module.
pub struct InstancePool {
    factory: InstanceFactory,
    config: PoolConfig,
    /// Idle instances ready for checkout.
    available: Mutex<VecDeque<GuestInstance>>,
    /// One permit per instance that may exist.
    permits: Arc<Semaphore>,
}

/// An instance checked out of the pool.
///
/// Give it back with [`InstancePool::release`]. A lease that is dropped
/// instead discards its instance and frees its slot.
pub struct Lease {
    instance: GuestInstance,
    _permit: OwnedSemaphorePermit,
}

impl Lease {
    pub fn instance(&self) -> &GuestInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut GuestInstance {
        &mut self.instance
    }
}

impl InstancePool {
    pub fn new(factory: InstanceFactory, config: PoolConfig) -> Self {
        let max = config.max_instances.max(1);
        Self {
            factory,
            config: PoolConfig {
                max_instances: max,
                min_instances: config.min_instances.min(max),
                ..config
            },
            available: Mutex::new(VecDeque::new()),
            permits: Arc::new(Semaphore::new(max as usize)),
        }
    }

    /// Create instances until `min_instances` are idle, without letting idle
    /// plus checked-out instances exceed `max_instances`.
    pub async fn warm_up(&self) -> RuntimeResult<()> {
        let current = self.available.lock().await.len();
        let room = (self.config.max_instances as usize).saturating_sub(current + self.in_use());
        let needed = (self.config.min_instances as usize)
            .saturating_sub(current)
            .min(room);

        for _ in 0..needed {
            let instance = self
                .factory
                .create_instance(&self.config.init_budget)
                .await?;
            self.available.lock().await.push_back(instance);
        }

        info!(
            module = %self.factory.module().name(),
            min = self.config.min_instances,
            warmed = needed,
            "instance pool warmed"
        );
        Ok(())
    }

    /// Take an instance for exclusive use, waiting while the pool is at
    /// capacity.
    ///
    /// Returns an idle instance if one exists, otherwise creates a new one.
    pub async fn checkout(&self) -> RuntimeResult<Lease> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| RuntimeError::PoolClosed)?;

        let idle = self.available.lock().await.pop_front();
        let instance = match idle {
            Some(instance) => {
                debug!("acquired idle instance from pool");
                instance
            }
            None => {
                let instance = self
                    .factory
                    .create_instance(&self.config.init_budget)
                    .await?;
                debug!("created new instance for pool");
                instance
            }
        };

        Ok(Lease {
            instance,
            _permit: permit,
        })
    }

    /// Return a checked-out instance. Poisoned instances, or instances that
    /// still hold a request, are dropped.
    pub async fn release(&self, lease: Lease) {
        let Lease { instance, _permit } = lease;
        if instance.is_poisoned() || instance.has_request() {
            debug!(module = %instance.module_name(), "discarding poisoned instance");
            return;
        }
        self.available.lock().await.push_back(instance);
        debug!("instance returned to pool");
    }

    /// Refuse further checkouts. Outstanding leases stay valid.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Current number of idle instances.
    pub async fn idle_count(&self) -> usize {
        self.available.lock().await.len()
    }

    /// Number of instances currently checked out.
    pub fn in_use(&self) -> usize {
        (self.config.max_instances as usize).saturating_sub(self.permits.available_permits())
    }

    pub fn max_instances(&self) -> u32 {
        self.config.max_instances
    }

    pub fn min_instances(&self) -> u32 {
        self.config.min_instances
    }
}
