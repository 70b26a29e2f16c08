use std::path::Path;

use wasmsched_core::abi;
use wasmsched_host::{HostConfig, SchedEngine};
use wasmsched_runtime::{CallBudget, GuestInstance, GuestModule};

pub async fn run(guest: &Path, wasi: bool) -> anyhow::Result<()> {
    let engine = SchedEngine::new(HostConfig {
        wasi,
        ..HostConfig::default()
    })?;
    let module = GuestModule::from_file(&engine, guest)?;

    // Instantiating runs `_initialize` and the schema-version check.
    let instance = GuestInstance::new(&engine, &module, &CallBudget::unlimited()).await?;

    println!("✓ {} links against the scheduling ABI", module.name());
    for import in module.module().imports() {
        let marker = if abi::is_abi_module(import.module()) {
            "abi"
        } else {
            "ext"
        };
        println!("  import [{marker}] {}::{}", import.module(), import.name());
    }
    for export in module.module().exports() {
        println!("  export {}", export.name());
    }
    println!("  memory {} bytes", instance.memory_size());
    Ok(())
}
