use crate::compiler::{Compiler, PapyrusCompiler};
use crate::config::Settings;
use crate::errors::Result;
use crate::handler::{BuildSummary, ConsoleResultHandler, ResultHandler};
use crate::project::Project;
use crate::scanner::{self, WorkItem};
use crate::scheduler::Scheduler;
use std::sync::Arc;

/// Dependency injection container
/// Wires settings, project, compiler and result handler for a build
pub struct Container {
    settings: Arc<Settings>,
    project: Arc<Project>,
    compiler: Arc<dyn Compiler>,
    result_handler: Arc<dyn ResultHandler>,
}

impl Container {
    /// Create a container with the real compiler from the settings.
    /// Fails if the compiler isn't configured or doesn't exist.
    pub fn new(settings: Settings, project: Project, pretty: bool) -> Result<Self> {
        let executable = settings.check_compiler()?.to_path_buf();
        let compiler = Arc::new(PapyrusCompiler::new(executable, &project));
        let result_handler = Arc::new(ConsoleResultHandler::new(pretty));

        Ok(Container {
            settings: Arc::new(settings),
            project: Arc::new(project),
            compiler,
            result_handler,
        })
    }

    /// Create a container with custom dependencies (for testing)
    pub fn with_dependencies(
        settings: Settings,
        project: Project,
        compiler: Arc<dyn Compiler>,
        result_handler: Arc<dyn ResultHandler>,
    ) -> Self {
        Container {
            settings: Arc::new(settings),
            project: Arc::new(project),
            compiler,
            result_handler,
        }
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    pub fn result_handler(&self) -> &Arc<dyn ResultHandler> {
        &self.result_handler
    }

    /// Validate the project folders, then list the scripts to compile
    pub fn scripts_to_compile(&self) -> Result<Vec<WorkItem>> {
        self.project.check_folders()?;
        scanner::scripts_to_compile(&self.project)
    }

    /// Compile everything that is new or changed
    pub fn incremental(&self, scheduler: &Scheduler) -> Result<BuildSummary> {
        let items = self.scripts_to_compile()?;
        scheduler.run(self.compiler.as_ref(), items, self.result_handler.as_ref())
    }
}
