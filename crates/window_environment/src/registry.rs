//! Window-type descriptors and the registry the environment constructs windows from.
//!
//! A window type is a capability bundle: a name, default creation parameters, a constructor, and
//! an `attach` hook that re-installs behavior on a freshly built or restored window. Built-in
//! types are declared as TOML manifests under `window_types/` and compiled into a JSON catalog at
//! build time.

use std::{collections::BTreeMap, fmt, rc::Rc, sync::OnceLock};

use serde::Deserialize;

use crate::{
    model::{
        DesktopIcon, Viewport, WindowConfig, WindowId, BASE_WINDOW_TYPE, DEFAULT_WINDOW_HEIGHT,
        DEFAULT_WINDOW_WIDTH,
    },
    window::Window,
};

include!(concat!(env!("OUT_DIR"), "/window_type_catalog_generated.rs"));

/// Descriptor for a kind of window.
pub trait WindowType {
    fn type_name(&self) -> &str;

    /// Creation parameters used for fields a caller leaves out.
    fn default_config(&self) -> WindowConfig;

    /// Builds the window. `config` is already back-filled with the registered defaults.
    fn construct(&self, id: WindowId, config: &WindowConfig, viewport: Viewport) -> Window {
        Window::new(id, self.type_name(), config, viewport)
    }

    /// Installs type-specific behavior. Runs after construction and after every restore.
    fn attach(&self, _window: &mut Window) {}
}

/// The plain window every environment can build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseWindowType;

impl WindowType for BaseWindowType {
    fn type_name(&self) -> &str {
        BASE_WINDOW_TYPE
    }

    fn default_config(&self) -> WindowConfig {
        WindowConfig::sized(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT).with_title("Untitled")
    }
}

/// Built-in window type declared in a `window_types/*.toml` manifest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestWindowType {
    pub type_name: String,
    pub title: String,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
    #[serde(default)]
    pub show_on_desktop: bool,
    /// Document loaded into the window when it is opened from its desktop icon.
    #[serde(default)]
    pub home_url: Option<String>,
}

impl ManifestWindowType {
    pub fn desktop_icon(&self) -> DesktopIcon {
        DesktopIcon {
            id: format!("icon-{}", self.type_name),
            label: self.title.clone(),
            icon: self.icon.clone(),
            class_name: self.type_name.clone(),
            config: WindowConfig::default(),
            remote_url: self.home_url.clone(),
        }
    }
}

impl WindowType for ManifestWindowType {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn default_config(&self) -> WindowConfig {
        WindowConfig {
            icon: self.icon.clone(),
            content: Some(self.content.clone()),
            styles: (!self.styles.is_empty()).then(|| self.styles.clone()),
            ..WindowConfig::sized(self.width, self.height).with_title(self.title.clone())
        }
    }
}

/// Returns the built-in window types compiled from the manifest catalog.
pub fn builtin_window_types() -> &'static [ManifestWindowType] {
    static CATALOG: OnceLock<Vec<ManifestWindowType>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        serde_json::from_str(WINDOW_TYPE_CATALOG_JSON)
            .expect("generated window type catalog should parse")
    })
}

/// Window type reference accepted by [`crate::Environment::create_window`].
#[derive(Clone)]
pub enum WindowClass {
    /// A type looked up by name; unknown names fall back to the base type.
    Named(String),
    /// A descriptor, registered on first use.
    Descriptor(Rc<dyn WindowType>),
}

impl WindowClass {
    pub fn type_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Descriptor(descriptor) => descriptor.type_name(),
        }
    }
}

impl fmt::Debug for WindowClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Descriptor(descriptor) => f
                .debug_tuple("Descriptor")
                .field(&descriptor.type_name())
                .finish(),
        }
    }
}

impl From<&str> for WindowClass {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for WindowClass {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Rc<dyn WindowType>> for WindowClass {
    fn from(descriptor: Rc<dyn WindowType>) -> Self {
        Self::Descriptor(descriptor)
    }
}

/// A registered type with the defaults it was registered under.
#[derive(Clone)]
pub struct RegisteredWindowType {
    pub descriptor: Rc<dyn WindowType>,
    pub defaults: WindowConfig,
}

/// Type name to descriptor map. The base type is always present.
#[derive(Clone)]
pub struct WindowTypeRegistry {
    base: RegisteredWindowType,
    types: BTreeMap<String, RegisteredWindowType>,
}

impl Default for WindowTypeRegistry {
    fn default() -> Self {
        let base: Rc<dyn WindowType> = Rc::new(BaseWindowType);
        Self {
            base: RegisteredWindowType {
                defaults: base.default_config(),
                descriptor: base,
            },
            types: BTreeMap::new(),
        }
    }
}

impl WindowTypeRegistry {
    /// Registry holding the base type only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the base type and every built-in manifest type.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        for manifest in builtin_window_types() {
            registry.register(Rc::new(manifest.clone()));
        }
        registry
    }

    /// Registers `descriptor` under its own defaults, replacing any type with the same name.
    pub fn register(&mut self, descriptor: Rc<dyn WindowType>) {
        let defaults = descriptor.default_config();
        self.register_with_defaults(descriptor, defaults);
    }

    pub fn register_with_defaults(&mut self, descriptor: Rc<dyn WindowType>, defaults: WindowConfig) {
        let entry = RegisteredWindowType {
            descriptor,
            defaults,
        };
        let name = entry.descriptor.type_name().to_string();
        if name == BASE_WINDOW_TYPE {
            self.base = entry;
        } else {
            self.types.insert(name, entry);
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&RegisteredWindowType> {
        if type_name == BASE_WINDOW_TYPE {
            return Some(&self.base);
        }
        self.types.get(type_name)
    }

    pub fn base(&self) -> &RegisteredWindowType {
        &self.base
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    /// Registered type names, base type first.
    pub fn names(&self) -> Vec<String> {
        std::iter::once(BASE_WINDOW_TYPE.to_string())
            .chain(self.types.keys().cloned())
            .collect()
    }
}

impl fmt::Debug for WindowTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowTypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}
