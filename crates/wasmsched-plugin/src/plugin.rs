//! FilterPlugin — runs the guest's `filter` export once per decision.
//!
//! Each call checks out a pooled instance, attaches a fresh
//! `RequestContext` through a `CallHandle`, invokes the guest, maps its
//! return code and outcome to a [`Decision`], and gives the instance back.
//! Trapped instances are discarded by the pool.

use std::sync::Arc;

use tracing::{debug, info, warn};

use wasmsched_core::{Node, PluginConfig, Pod, Status};
use wasmsched_host::{CallObserver, HostConfig, RequestContext, SchedEngine};
use wasmsched_runtime::{
    CallBudget, EpochTicker, GuestModule, InstanceFactory, InstancePool, PoolConfig,
};

use crate::decision::Decision;
use crate::error::{PluginError, PluginResult};

pub struct FilterPlugin {
    pool: InstancePool,
    budget: CallBudget,
    observer: Option<Arc<dyn CallObserver>>,
    /// Drives per-call deadlines; present when a timeout is configured.
    _ticker: Option<EpochTicker>,
}

impl FilterPlugin {
    /// Load the guest named by `config.guest_path` and warm the pool.
    pub async fn new(config: &PluginConfig) -> PluginResult<Self> {
        let engine = Self::engine(config)?;
        let module = GuestModule::from_file(&engine, &config.guest_path)?;
        Self::build(engine, module, config).await
    }

    /// Like [`FilterPlugin::new`], with the guest given as bytes.
    /// `config.guest_path` is ignored.
    pub async fn from_bytes(config: &PluginConfig, name: &str, bytes: &[u8]) -> PluginResult<Self> {
        let engine = Self::engine(config)?;
        let module = GuestModule::from_bytes(&engine, name, bytes)?;
        Self::build(engine, module, config).await
    }

    fn engine(config: &PluginConfig) -> PluginResult<SchedEngine> {
        let host = HostConfig::from_plugin_config(config).map_err(PluginError::Config)?;
        SchedEngine::new(host).map_err(PluginError::Setup)
    }

    async fn build(
        engine: SchedEngine,
        module: GuestModule,
        config: &PluginConfig,
    ) -> PluginResult<Self> {
        let budget = CallBudget::from_config(config).map_err(PluginError::Config)?;
        let pool_config = PoolConfig::from_plugin_config(config).map_err(PluginError::Config)?;

        let ticker = if engine.config().epoch_interruption {
            let ticker = EpochTicker::start(engine.engine().clone())
                .map_err(|err| PluginError::Setup(err.into()))?;
            Some(ticker)
        } else {
            None
        };

        let name = module.name().to_string();
        let pool = InstancePool::new(InstanceFactory::new(engine, module), pool_config);
        pool.warm_up().await?;

        info!(
            module = %name,
            max_instances = pool.max_instances(),
            fuel = ?budget.fuel,
            deadline_ticks = ?budget.deadline_ticks,
            "filter plugin ready"
        );

        Ok(Self {
            pool,
            budget,
            observer: None,
            _ticker: ticker,
        })
    }

    /// Attach an observer to every subsequent call.
    pub fn with_observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Ask the guest whether `workload` may be placed on `target`.
    ///
    /// A normal return always yields a [`Decision`], whatever code the guest
    /// chose. Traps and host faults are errors and never rejections.
    pub async fn filter(
        &self,
        target: Option<Arc<Node>>,
        workload: Arc<Pod>,
    ) -> PluginResult<Decision> {
        let key = workload.key();
        let target_name = target.as_ref().map(|node| node.name.clone());
        let mut lease = self.pool.checkout().await?;

        let result = {
            let request = RequestContext::new(target, workload);
            let mut call = lease
                .instance_mut()
                .attach(request, self.observer.clone())
                .map_err(PluginError::HostFault)?;
            debug!(workload = %key, target = ?target_name, phase = ?call.phase(), "context attached");

            let invoked = call.invoke(&self.budget).await;
            debug!(workload = %key, phase = ?call.phase(), "guest returned");
            match invoked {
                Ok(raw) => Ok((raw, call.finish())),
                Err(err) => Err(PluginError::from_call(err)),
            }
        };
        self.pool.release(lease).await;

        let (raw, outcome) = result.inspect_err(|err| {
            warn!(workload = %key, target = ?target_name, error = %err, "decision call failed");
        })?;
        let decision = Decision::from_guest(raw, outcome);
        debug!(
            workload = %key,
            target = ?target_name,
            code = %decision.code,
            guest_code = decision.guest_code,
            "decision collected"
        );
        Ok(decision)
    }

    /// [`FilterPlugin::filter`] collapsed onto the framework's status.
    pub async fn filter_status(&self, target: Option<Arc<Node>>, workload: Arc<Pod>) -> Status {
        match self.filter(target, workload).await {
            Ok(decision) => decision.into_status(),
            Err(err) => err.into_status(),
        }
    }

    pub fn pool(&self) -> &InstancePool {
        &self.pool
    }

    /// Stop serving calls. In-flight calls complete.
    pub fn close(&self) {
        self.pool.close();
    }
}
