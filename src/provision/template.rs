use std::path::PathBuf;

use crate::config::{ConfigurationSet, Role};
use crate::error::RenderError;

pub const CONFIG_PROPERTIES: &str = "config.properties";
pub const JVM_CONFIG: &str = "jvm.config";
pub const NODE_PROPERTIES: &str = "node.properties";
pub const QUEUE_CONFIG: &str = "queues.json";

/// Which template to render, where the result lands, and which role
/// branch (if any) the renderer should select.
#[derive(Debug, Clone)]
pub struct TemplateSpec {
    pub id: String,
    pub dest: PathBuf,
    pub tag: Option<Role>,
}

impl TemplateSpec {
    pub fn new(id: &str, dest: PathBuf, tag: Option<Role>) -> Self {
        TemplateSpec {
            id: id.to_string(),
            dest,
            tag,
        }
    }
}

/// Substitution values handed to the renderer, snapshotted from the
/// configuration set.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub node_id: String,
    pub node_environment: String,
    pub data_dir: PathBuf,
    pub coordinator_host: String,
    pub server_port: u16,
    pub singlenode: bool,
    pub jvm_heapsize: String,
    pub query_max_memory: String,
    pub query_max_memory_per_node: String,
}

impl RenderContext {
    pub fn new(config: &ConfigurationSet) -> Self {
        RenderContext {
            node_id: config.node_id.clone(),
            node_environment: config.node_environment.clone(),
            data_dir: config.data_dir.clone(),
            coordinator_host: config.coordinator_host.clone(),
            server_port: config.server_port,
            singlenode: config.singlenode,
            jvm_heapsize: config.jvm_heapsize.clone(),
            query_max_memory: config.query_max_memory.clone(),
            query_max_memory_per_node: config.query_max_memory_per_node.clone(),
        }
    }
}

/// External-renderer seam. The materializer decides which templates go
/// where; implementations only turn an id + context into file content.
pub trait Renderer: Send + Sync {
    fn render(&self, spec: &TemplateSpec, ctx: &RenderContext) -> Result<String, RenderError>;
}

/// Renders the stock node templates from the substitution context.
pub struct BuiltinRenderer;

impl Renderer for BuiltinRenderer {
    fn render(&self, spec: &TemplateSpec, ctx: &RenderContext) -> Result<String, RenderError> {
        match spec.id.as_str() {
            CONFIG_PROPERTIES => config_properties(spec.tag, ctx),
            JVM_CONFIG => jvm_config(ctx),
            NODE_PROPERTIES => node_properties(ctx),
            QUEUE_CONFIG => Ok(queue_config()),
            _ => Err(RenderError::UnknownTemplate {
                id: spec.id.clone(),
            }),
        }
    }
}

fn config_properties(tag: Option<Role>, ctx: &RenderContext) -> Result<String, RenderError> {
    if ctx.coordinator_host.is_empty() {
        return Err(RenderError::MissingValue {
            id: CONFIG_PROPERTIES.to_string(),
            key: "coordinator_host",
        });
    }

    let mut out = String::new();
    match tag {
        Some(Role::Coordinator) => {
            out.push_str("coordinator=true\n");
            out.push_str(&format!(
                "node-scheduler.include-coordinator={}\n",
                ctx.singlenode
            ));
            out.push_str("discovery-server.enabled=true\n");
        }
        Some(Role::Worker) => out.push_str("coordinator=false\n"),
        None => {}
    }
    out.push_str(&format!("http-server.http.port={}\n", ctx.server_port));
    out.push_str(&format!("query.max-memory={}\n", ctx.query_max_memory));
    out.push_str(&format!(
        "query.max-memory-per-node={}\n",
        ctx.query_max_memory_per_node
    ));
    out.push_str(&format!(
        "discovery.uri=http://{}:{}\n",
        ctx.coordinator_host, ctx.server_port
    ));
    Ok(out)
}

fn jvm_config(ctx: &RenderContext) -> Result<String, RenderError> {
    if ctx.jvm_heapsize.is_empty() {
        return Err(RenderError::MissingValue {
            id: JVM_CONFIG.to_string(),
            key: "jvm_heapsize",
        });
    }

    Ok(format!(
        "-server\n\
         -Xmx{}\n\
         -XX:+UseG1GC\n\
         -XX:G1HeapRegionSize=32M\n\
         -XX:+UseGCOverheadLimit\n\
         -XX:+ExplicitGCInvokesConcurrent\n\
         -XX:+HeapDumpOnOutOfMemoryError\n\
         -XX:OnOutOfMemoryError=kill -9 %p\n",
        ctx.jvm_heapsize
    ))
}

fn node_properties(ctx: &RenderContext) -> Result<String, RenderError> {
    if ctx.node_id.is_empty() {
        return Err(RenderError::MissingValue {
            id: NODE_PROPERTIES.to_string(),
            key: "node_id",
        });
    }

    Ok(format!(
        "node.environment={}\nnode.id={}\nnode.data-dir={}\n",
        ctx.node_environment,
        ctx.node_id,
        ctx.data_dir.display()
    ))
}

fn queue_config() -> String {
    // Admits everything into one queue; deployments with real queueing
    // policies override this file through the external renderer.
    "{\n  \"queues\": {\n    \"global\": {\n      \"maxConcurrent\": 100,\n      \"maxQueued\": 1000\n    }\n  },\n  \"rules\": [\n    {\n      \"queues\": [\"global\"]\n    }\n  ]\n}\n"
        .to_string()
}
