//! Configuration materialization: one idempotent `configure` cycle turns
//! the delivered configuration set into the directory-and-file layout the
//! node process reads at startup.

pub mod directory;
pub mod plugin;
pub mod properties;
pub mod template;

use std::fs;

use crate::config::{ConfigurationSet, Role};
use crate::error::{ProvisioningError, Result};
use crate::layout::NodeLayout;
use crate::ownership::Ownership;
use directory::{DirectoryProvisioner, DirectorySpec};
use template::{RenderContext, Renderer, TemplateSpec};

const README: &str = "This directory is generated by prestoctl.\n\
Do not edit: any manual change will be overwritten on the next configure run.\n";

/// Orchestrates the provisioners into one ordered configure cycle.
/// Later steps assume earlier steps' filesystem state; any failure aborts
/// the remainder and surfaces the originating error unmodified.
pub struct NodeConfigurator<'a> {
    config: &'a ConfigurationSet,
    layout: NodeLayout,
    renderer: &'a dyn Renderer,
    ownership: &'a dyn Ownership,
}

impl<'a> NodeConfigurator<'a> {
    pub fn new(
        config: &'a ConfigurationSet,
        renderer: &'a dyn Renderer,
        ownership: &'a dyn Ownership,
    ) -> Self {
        NodeConfigurator {
            layout: NodeLayout::new(config),
            config,
            renderer,
            ownership,
        }
    }

    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    pub fn configure(&self, role: Role) -> Result<()> {
        tracing::info!(role = %role, root = %self.layout.node_root.display(), "Configuring node");
        let dirs = DirectoryProvisioner::new(self.ownership);

        // 1. Start from a clean slate: stale files from a previous cycle
        //    must never leak into the new one.
        dirs.reset(&self.layout.etc_dir)?;

        // 2. Directories, ownership enforced.
        for path in [
            self.layout.etc_dir.clone(),
            self.layout.catalog_dir.clone(),
            self.layout.pid_dir.clone(),
            self.layout.log_dir.clone(),
        ] {
            dirs.ensure(&DirectorySpec::new(
                path,
                &self.config.app_user,
                &self.config.user_group,
            ))?;
        }

        // 3. Templates. Only config.properties is role-tagged.
        let ctx = RenderContext::new(self.config);
        for spec in [
            TemplateSpec::new(
                template::CONFIG_PROPERTIES,
                self.layout.config_properties(),
                Some(role),
            ),
            TemplateSpec::new(template::JVM_CONFIG, self.layout.jvm_config(), None),
            TemplateSpec::new(template::NODE_PROPERTIES, self.layout.node_properties(), None),
            TemplateSpec::new(template::QUEUE_CONFIG, self.layout.queue_config(), None),
        ] {
            self.render_into_place(&spec, &ctx)?;
        }

        // 4. Advisory notice for operators poking around the tree.
        self.write_readme()?;

        // 5. Overrides land after the rendered base values, append-only.
        properties::append_lines(&self.layout.jvm_config(), &self.config.jvm_args)?;
        properties::append_lines(&self.layout.log_properties(), &self.config.log_properties)?;
        properties::append_lines(
            &self.layout.config_properties(),
            &self.config.additional_config_properties,
        )?;
        properties::append_lines(
            &self.layout.node_properties(),
            &self.config.additional_node_properties,
        )?;

        // 6. One properties file per catalog.
        properties::write_catalogs(&self.layout.catalog_dir, &self.config.catalogs)?;

        // 7. Addon plugins, additive-only.
        if !self.config.plugins.is_empty() {
            if let Some(src) = &self.config.plugin_src_dir {
                plugin::provision_plugins(&self.config.plugins, src, &self.layout.plugin_dir)?;
            }
        }

        tracing::info!(etc = %self.layout.etc_dir.display(), "Node configuration materialized");
        Ok(())
    }

    fn render_into_place(&self, spec: &TemplateSpec, ctx: &RenderContext) -> Result<()> {
        let content = self.renderer.render(spec, ctx)?;
        fs::write(&spec.dest, content).map_err(|source| crate::error::RenderError::Write {
            id: spec.id.clone(),
            path: spec.dest.clone(),
            source,
        })?;
        self.ownership
            .apply(&spec.dest, &self.config.app_user, &self.config.user_group)?;
        tracing::debug!(template = %spec.id, dest = %spec.dest.display(), tag = ?spec.tag, "Rendered template");
        Ok(())
    }

    fn write_readme(&self) -> Result<()> {
        let path = self.layout.readme();
        fs::write(&path, README).map_err(|source| ProvisioningError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(())
    }
}
