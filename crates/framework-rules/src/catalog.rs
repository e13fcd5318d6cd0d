//! The actual pattern tables, grounded in the original agent's
//! `framework_selectors.py` "Day 0" knowledge: each framework is keyed by
//! component class, each component carries a base pattern plus named
//! variants. Covers Material UI, Ant Design, and Bootstrap -- the three
//! frameworks the original catalogs in depth -- plus the universal table
//! used when no framework is detected.

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    MaterialUi,
    AntDesign,
    Bootstrap,
}

impl Framework {
    pub fn name(&self) -> &'static str {
        match self {
            Framework::MaterialUi => "Material UI",
            Framework::AntDesign => "Ant Design",
            Framework::Bootstrap => "Bootstrap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentClass {
    Button,
    TextField,
    Select,
    Checkbox,
    Dialog,
}

impl ComponentClass {
    pub const ALL: [ComponentClass; 5] = [
        ComponentClass::Button,
        ComponentClass::TextField,
        ComponentClass::Select,
        ComponentClass::Checkbox,
        ComponentClass::Dialog,
    ];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ComponentClass::Button => &["click", "button", "submit", "confirm", "send", "press", "tap"],
            ComponentClass::TextField => &["fill", "type", "enter", "input", "field", "textbox", "email", "password", "username"],
            ComponentClass::Select => &["select", "dropdown", "choose", "pick", "option"],
            ComponentClass::Checkbox => &["check", "checkbox", "uncheck", "toggle"],
            ComponentClass::Dialog => &["dialog", "modal", "close", "dismiss", "popup"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub template: String,
    pub relevance: f64,
}

impl Pattern {
    fn new(template: &str, relevance: f64) -> Self {
        Self { template: template.to_string(), relevance }
    }
}

type FrameworkTable = std::collections::HashMap<(Framework, ComponentClass), Vec<Pattern>>;

static FRAMEWORK_TABLE: Lazy<FrameworkTable> = Lazy::new(|| {
    use ComponentClass::*;
    use Framework::*;
    let mut table: FrameworkTable = std::collections::HashMap::new();

    table.insert((MaterialUi, Button), vec![
        Pattern::new("button.MuiButton-root:has-text('{text}')", 0.82),
        Pattern::new(".MuiButton-root.MuiButton-contained:has-text('{text}')", 0.78),
        Pattern::new(".MuiButton-root", 0.55),
        Pattern::new(".MuiIconButton-root", 0.5),
    ]);
    table.insert((MaterialUi, TextField), vec![
        Pattern::new(".MuiFormControl-root:has(.MuiInputLabel-root:has-text('{label}')) .MuiInputBase-input", 0.8),
        Pattern::new(".MuiInputBase-input[placeholder*='{text}']", 0.75),
        Pattern::new(".MuiInputBase-input[name='{name}']", 0.75),
        Pattern::new(".MuiOutlinedInput-input", 0.5),
    ]);
    table.insert((MaterialUi, Select), vec![
        Pattern::new(".MuiFormControl-root:has(.MuiInputLabel-root:has-text('{label}')) .MuiSelect-select", 0.78),
        Pattern::new(".MuiSelect-select", 0.55),
        Pattern::new(".MuiMenuItem-root:has-text('{text}')", 0.7),
    ]);
    table.insert((MaterialUi, Checkbox), vec![
        Pattern::new(".MuiFormControlLabel-root:has-text('{label}') .MuiCheckbox-root", 0.78),
        Pattern::new(".MuiCheckbox-root input[type='checkbox']", 0.55),
    ]);
    table.insert((MaterialUi, Dialog), vec![
        Pattern::new(".MuiDialog-root button:has(.MuiSvgIcon-root[data-testid='CloseIcon'])", 0.75),
        Pattern::new(".MuiDialog-paper", 0.45),
    ]);

    table.insert((AntDesign, Button), vec![
        Pattern::new("button.ant-btn:has-text('{text}')", 0.82),
        Pattern::new(".ant-btn-primary:has-text('{text}')", 0.78),
        Pattern::new(".ant-btn", 0.55),
    ]);
    table.insert((AntDesign, TextField), vec![
        Pattern::new(".ant-form-item:has(.ant-form-item-label:has-text('{label}')) input.ant-input", 0.8),
        Pattern::new("input.ant-input[placeholder*='{text}']", 0.75),
        Pattern::new(".ant-input", 0.5),
    ]);
    table.insert((AntDesign, Select), vec![
        Pattern::new(".ant-select:has-text('{label}')", 0.75),
        Pattern::new(".ant-select-selector", 0.55),
        Pattern::new(".ant-select-item-option:has-text('{text}')", 0.7),
    ]);
    table.insert((AntDesign, Checkbox), vec![
        Pattern::new(".ant-checkbox-wrapper:has-text('{label}')", 0.78),
        Pattern::new(".ant-checkbox-input", 0.55),
    ]);
    table.insert((AntDesign, Dialog), vec![
        Pattern::new(".ant-modal-close", 0.75),
        Pattern::new(".ant-modal-content", 0.45),
    ]);

    table.insert((Bootstrap, Button), vec![
        Pattern::new("button.btn:has-text('{text}')", 0.78),
        Pattern::new(".btn-primary:has-text('{text}')", 0.74),
        Pattern::new(".btn", 0.5),
    ]);
    table.insert((Bootstrap, TextField), vec![
        Pattern::new(".form-group:has(label:has-text('{label}')) .form-control", 0.76),
        Pattern::new(".form-control[placeholder*='{text}']", 0.72),
        Pattern::new(".form-control", 0.45),
    ]);
    table.insert((Bootstrap, Select), vec![
        Pattern::new("select.form-select", 0.6),
        Pattern::new(".dropdown-item:has-text('{text}')", 0.68),
    ]);
    table.insert((Bootstrap, Checkbox), vec![
        Pattern::new(".form-check:has-text('{label}') .form-check-input", 0.74),
        Pattern::new(".form-check-input", 0.5),
    ]);
    table.insert((Bootstrap, Dialog), vec![
        Pattern::new("[data-dismiss='modal']", 0.75),
        Pattern::new(".modal-content", 0.45),
    ]);

    table
});

type UniversalTable = std::collections::HashMap<ComponentClass, Vec<Pattern>>;

static UNIVERSAL_TABLE: Lazy<UniversalTable> = Lazy::new(|| {
    use ComponentClass::*;
    let mut table: UniversalTable = std::collections::HashMap::new();

    table.insert(Button, vec![
        Pattern::new("button:has-text('{text}')", 0.6),
        Pattern::new("[role='button']:has-text('{text}')", 0.55),
        Pattern::new("a:has-text('{text}')", 0.45),
        Pattern::new("input[type='submit']", 0.4),
    ]);
    table.insert(TextField, vec![
        Pattern::new("input[placeholder*='{text}']", 0.55),
        Pattern::new("input[name*='{name}']", 0.5),
        Pattern::new("label:has-text('{label}') + input", 0.5),
        Pattern::new("textarea", 0.35),
    ]);
    table.insert(Select, vec![
        Pattern::new("select", 0.5),
        Pattern::new("[role='listbox']", 0.45),
        Pattern::new("option:has-text('{text}')", 0.5),
    ]);
    table.insert(Checkbox, vec![
        Pattern::new("input[type='checkbox']", 0.5),
        Pattern::new("[role='checkbox']", 0.45),
    ]);
    table.insert(Dialog, vec![
        Pattern::new("[aria-label='Close']", 0.55),
        Pattern::new(".modal-close", 0.5),
        Pattern::new("[role='dialog']", 0.4),
    ]);

    table
});

pub fn framework_patterns(framework: Framework, component: ComponentClass) -> &'static [Pattern] {
    FRAMEWORK_TABLE.get(&(framework, component)).map(|v| v.as_slice()).unwrap_or(&[])
}

pub fn universal_patterns(component: ComponentClass) -> &'static [Pattern] {
    UNIVERSAL_TABLE.get(&component).map(|v| v.as_slice()).unwrap_or(&[])
}
