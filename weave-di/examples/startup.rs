//! Registers a small application, loads it and runs its exec hooks.

use std::sync::Arc;
use weave_di::prelude::*;

struct Settings {
    greeting: String,
}

struct Greeter {
    settings: Arc<Settings>,
}

fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut engine = Engine::new();
    engine.module("settings", &[])?.singleton("settings", &[], |_| {
        Ok(instance(Settings {
            greeting: "Hello from weave".to_string(),
        }))
    })?;
    engine
        .module("app", &["settings"])?
        .transient("greeter", &["settings"], |args| {
            let settings = downcast::<Settings>(&args[0])
                .ok_or_else(|| anyhow::anyhow!("settings has the wrong type"))?;
            Ok(instance(Greeter { settings }))
        })?
        .transient("app_run", &[], |_| {
            println!("app loaded");
            Ok(unit())
        })?
        .transient("app_exec", &["greeter"], |args| {
            if let Some(greeter) = downcast::<Greeter>(&args[0]) {
                println!("{}", greeter.settings.greeting);
            }
            Ok(unit())
        })?;

    engine.load_module("app")?;
    engine.execute()?;
    engine.destroy();
    Ok(())
}
