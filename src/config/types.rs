/// Default network port advertised to the workload when the bundle does not
/// configure one.
pub const DEFAULT_PORT: u16 = 8080;

/// How to invoke the packaged workload, resolved from the bundle's
/// configuration file.
#[derive(Debug, Clone)]
pub struct LaunchConfiguration {
    /// Executable target inside the application root. Required.
    pub target: String,
    /// Invocation parameters, inserted between the target and any
    /// passthrough CLI arguments.
    pub params: Vec<String>,
    /// Network port for the workload.
    pub port: u16,
    /// Path suffix under the extracted dependency directory, when the
    /// packaging step nests installed dependencies one level deeper.
    pub deps_suffix: Option<String>,
    /// Ask the runtime to prefer precompiled sources where available.
    pub precompile: bool,
}
