use graphlang::{EngineConfig, GraphEngine, GraphResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEMO_SCRIPT: &str = r#"
add node key=alice,tags=person;
add node key=bob,tags="person,team=core";
add node key=report, body { 'quarterly numbers' };
add edge fromKey=alice,toKey=bob,edgeType=knows,since=2020;
add edge fromKey=bob,toKey=report,edgeType=owns;
select (key=alice) a1 -> [edgeType=knows] a2 -> (person) a3;
select (team=core) -> [edgeType=owns] -> () return body;
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var_os("GRAPHLANG_CONFIG") {
        Some(path) => EngineConfig::from_yaml_file(PathBuf::from(path))?,
        None => EngineConfig::default(),
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("GraphLang v{}", graphlang::version());
    println!("==========================================");

    let engine = GraphEngine::new(config)?;
    engine.load().await?;

    let script = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)?,
        None => {
            println!("No script given, running the built-in demo\n");
            DEMO_SCRIPT.to_string()
        }
    };

    run(&engine, &script).await?;

    println!("\nGraph Statistics:");
    println!("  Total nodes: {}", engine.map().node_count());
    println!("  Total edges: {}", engine.map().edge_count());
    Ok(())
}

async fn run(engine: &GraphEngine, script: &str) -> GraphResult<()> {
    match engine.execute(script).await {
        Ok(batch) => {
            println!("{}", batch.to_json()?);
            Ok(())
        }
        Err(e) => {
            eprintln!("[{}] {}", e.status(), e);
            Err(e)
        }
    }
}
