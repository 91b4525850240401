//! Registry of compiled programs, looked up by name.

use log::{debug, info};
use std::{collections::HashMap, sync::Arc};
use wgpu::{ShaderModuleDescriptor, ShaderSource};

use crate::program::{BUILTIN_PROGRAMS, ProgramHandle, ProgramSource};

/// A compiled program and what its bind group expects.
#[derive(Debug)]
pub struct LoadedProgram {
    pub name: String,
    pub module: Arc<wgpu::ShaderModule>,
    pub uniform_size: u64,
}

/// Central registry for compiled shader modules.
///
/// Handles are indices into the registry and stay valid for its lifetime.
/// Loading a name again replaces the module behind the existing handle.
#[derive(Default)]
pub struct ProgramLibrary {
    programs: Vec<LoadedProgram>,
    by_name: HashMap<String, ProgramHandle>,
}

impl ProgramLibrary {
    /// Create a new empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// A library holding every built-in program.
    pub fn with_builtin_programs(device: &wgpu::Device) -> Self {
        let mut library = Self::new();
        for program in BUILTIN_PROGRAMS {
            library.load(device, &program);
        }
        library
    }

    /// Compile `source` and register it under its name.
    pub fn load(&mut self, device: &wgpu::Device, source: &ProgramSource) -> ProgramHandle {
        debug!("Loading program '{}' from source", source.name);

        let module = Arc::new(device.create_shader_module(ShaderModuleDescriptor {
            label: Some(source.name),
            source: ShaderSource::Wgsl(source.wgsl.into()),
        }));
        let loaded = LoadedProgram {
            name: source.name.to_string(),
            module,
            uniform_size: source.uniform_size,
        };

        if let Some(&handle) = self.by_name.get(source.name) {
            self.programs[handle.0 as usize] = loaded;
            info!("Replaced program '{}'", source.name);
            return handle;
        }

        let handle = ProgramHandle(self.programs.len() as u32);
        self.programs.push(loaded);
        self.by_name.insert(source.name.to_string(), handle);
        info!("Loaded program '{}'", source.name);
        handle
    }

    /// Handle of a registered program.
    pub fn handle(&self, name: &str) -> Option<ProgramHandle> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, handle: ProgramHandle) -> Option<&LoadedProgram> {
        self.programs.get(handle.0 as usize)
    }

    /// Number of loaded programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
