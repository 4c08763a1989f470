use std::sync::Arc;

use serial_test::serial;
use stylebind::inject::{CLASSES, SHEET};
use stylebind::{
    default_registry, inject, inject_with, ContextProvider, InjectOptions, InjectorFactory,
    MountPoint, Node, Props, RegistryContext, RuleSet, SheetError, SheetOptions,
    SheetsRegistry, SheetsRegistryProvider, StyleDefinition, StyleEngine, StyleError, Theme,
    ThemeProvider,
};

struct Scope {
    engine: Arc<StyleEngine>,
    registry: SheetsRegistry,
}

impl Scope {
    fn new() -> Self {
        Self {
            engine: Arc::new(StyleEngine::new()),
            registry: SheetsRegistry::new(),
        }
    }

    fn context(&self) -> RegistryContext {
        RegistryContext::new(self.registry.clone(), Arc::clone(&self.engine))
    }

    fn root(&self) -> MountPoint {
        MountPoint::with_context(self.context())
    }

    fn attached(&self) -> usize {
        self.engine.surface().len()
    }
}

fn button_rules(color: &str) -> RuleSet {
    RuleSet::new().rule("button", [("color", color)])
}

fn describe(props: &Props) -> Node {
    let keys: Vec<&str> = props.classes().map(|c| c.keys().collect()).unwrap_or_default();
    Node::text(keys.join(","))
}

#[test]
fn attaches_on_mount_and_detaches_on_unmount() {
    let scope = Scope::new();
    let wrapper = inject(button_rules("red")).container();
    let mut root = scope.root();

    root.render(wrapper.element(Props::new())).unwrap();
    assert_eq!(scope.attached(), 1);

    root.unmount().unwrap();
    assert_eq!(scope.attached(), 0);
}

#[test]
fn rerendering_same_wrapper_reuses_sheet() {
    let scope = Scope::new();
    let wrapper = inject(button_rules("red")).container();
    let mut root = scope.root();

    root.render(wrapper.element(Props::new())).unwrap();
    let first = root.instance().and_then(|i| i.sheet()).unwrap();
    assert_eq!(scope.attached(), 1);

    root.render(wrapper.element(Props::new())).unwrap();
    let second = root.instance().and_then(|i| i.sheet()).unwrap();
    assert_eq!(scope.attached(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn passes_classes_for_every_rule() {
    let scope = Scope::new();
    let rules = RuleSet::new()
        .rule("a", [("color", "red")])
        .rule("b", [("color", "blue")]);
    let wrapper = inject(rules).wrap(describe);
    let mut root = scope.root();

    let output = root.render(wrapper.element(Props::new())).unwrap();
    assert_eq!(output.to_text(), "a,b");
}

#[test]
fn caller_classes_win() {
    let scope = Scope::new();
    let wrapper = inject(button_rules("red")).wrap(|props: &Props| {
        Node::text(props.value(CLASSES).and_then(|v| v.as_str()).unwrap_or("computed"))
    });
    let mut root = scope.root();

    let output = root
        .render(wrapper.element(Props::new().with(CLASSES, "X")))
        .unwrap();
    assert_eq!(output.to_text(), "X");
    assert_eq!(scope.attached(), 1);
}

#[test]
fn caller_sheet_wins() {
    let scope = Scope::new();
    let custom = scope
        .engine
        .create_style_sheet(button_rules("green"), SheetOptions::new())
        .unwrap();
    let expected = custom.id();
    let wrapper = inject(button_rules("red")).wrap(move |props: &Props| {
        let same = props.sheet().is_some_and(|s| s.id() == expected);
        Node::text(same.to_string())
    });
    let mut root = scope.root();

    let output = root
        .render(wrapper.element(Props::new().with(SHEET, Arc::clone(&custom))))
        .unwrap();
    assert_eq!(output.to_text(), "true");
    assert!(!custom.is_attached());
}

#[test]
fn explicit_index_is_kept() {
    let scope = Scope::new();
    let wrapper = inject_with(button_rules("red"), InjectOptions::new().index(1234)).container();
    let mut root = scope.root();

    root.render(wrapper.element(Props::new())).unwrap();
    assert_eq!(scope.registry.indices(), vec![1234]);
}

#[test]
fn creation_order_decides_registry_order() {
    let scope = Scope::new();
    let first = inject(button_rules("red")).container();
    let second = inject(button_rules("blue")).container();
    let late = inject_with(button_rules("green"), InjectOptions::new().index(0)).container();

    let mut a = scope.root();
    let mut b = scope.root();
    let mut c = scope.root();
    c.render(late.element(Props::new())).unwrap();
    b.render(second.element(Props::new())).unwrap();
    a.render(first.element(Props::new())).unwrap();

    let indices = scope.registry.indices();
    assert_eq!(indices.len(), 3);
    assert!(indices[0] < indices[1]);
    assert!(indices[1] < 0);
    assert_eq!(indices[2], 0);
    assert_eq!(Some(indices[0]), first.index());

    let css = scope.registry.to_css();
    let red = css.find("color: red").unwrap();
    let blue = css.find("color: blue").unwrap();
    let green = css.find("color: green").unwrap();
    assert!(red < blue && blue < green);
}

#[test]
#[serial]
fn default_registry_orders_by_creation() {
    default_registry().reset();
    let first = inject(button_rules("red")).container();
    let second = inject(button_rules("blue")).container();

    let mut b = MountPoint::new();
    let mut a = MountPoint::new();
    b.render(second.element(Props::new())).unwrap();
    a.render(first.element(Props::new())).unwrap();

    let registry = default_registry();
    let indices = registry.indices();
    assert_eq!(indices, vec![first.index().unwrap(), second.index().unwrap()]);
    assert!(indices[1] < 0);

    a.unmount().unwrap();
    b.unmount().unwrap();
    assert!(registry.is_empty());
}

#[test]
fn container_renders_children() {
    let scope = Scope::new();
    let wrapper = inject(button_rules("red")).container();
    let mut root = scope.root();

    let props = Props::new().with_child("hello").with_child(" world");
    let output = root.render(wrapper.element(props)).unwrap();
    assert_eq!(output.to_text(), "hello world");
    assert_eq!(scope.attached(), 1);
}

#[test]
fn nested_wrappers_render_through() {
    let scope = Scope::new();
    let inner = inject(button_rules("red")).wrap(describe);
    let outer = inject(RuleSet::new().rule("panel", [("margin", "0")])).container();

    let mut inner_instance = inner.instantiate(Props::new());
    inner_instance.mount(&scope.context()).unwrap();
    let child = inner_instance.render().unwrap();

    let mut root = scope.root();
    let output = root
        .render(outer.element(Props::new().with_child(child)))
        .unwrap();
    assert_eq!(output.to_text(), "button");
    assert_eq!(scope.attached(), 2);

    inner_instance.unmount().unwrap();
    root.unmount().unwrap();
    assert_eq!(scope.attached(), 0);
}

#[test]
fn hot_reload_with_redefine() {
    let scope = Scope::new();
    let wrapper = inject(button_rules("red")).container();
    let mut root = scope.root();
    root.render(wrapper.element(Props::new())).unwrap();
    let before = root.instance().and_then(|i| i.sheet()).unwrap();

    wrapper.redefine(button_rules("green"));
    root.force_update().unwrap();

    assert_eq!(scope.attached(), 1);
    assert!(!before.is_attached());
    let css = scope.engine.surface().to_css();
    assert!(css.contains("color: green"));
    assert!(!css.contains("color: red"));
    assert_eq!(scope.registry.len(), 1);
}

#[test]
fn hot_reload_from_new_wrapper_type() {
    let scope = Scope::new();
    let wrapper = inject(button_rules("red")).container();
    let mut root = scope.root();
    root.render(wrapper.element(Props::new())).unwrap();

    let reloaded = inject(button_rules("green")).container();
    wrapper.hot_swap_from(&reloaded);
    root.force_update().unwrap();

    assert_eq!(scope.attached(), 1);
    assert_eq!(scope.registry.len(), 1);
    let css = scope.registry.to_css();
    assert!(css.contains("color: green"));
    assert!(!css.contains("color: red"));

    root.unmount().unwrap();
    assert_eq!(scope.attached(), 0);
    assert!(scope.registry.is_empty());
}

#[test]
fn accepts_pre_built_sheet() {
    let scope = Scope::new();
    let sheet = scope
        .engine
        .create_style_sheet(button_rules("red"), SheetOptions::new())
        .unwrap();
    let expected = sheet.id();
    let wrapper = inject(Arc::clone(&sheet)).wrap(move |props: &Props| {
        let same = props.sheet().is_some_and(|s| s.id() == expected);
        Node::text(same.to_string())
    });
    let mut root = scope.root();

    let output = root.render(wrapper.element(Props::new())).unwrap();
    assert_eq!(output.to_text(), "true");
    assert!(sheet.is_attached());

    root.unmount().unwrap();
    assert!(!sheet.is_attached());
    assert_eq!(sheet.rules(), button_rules("red"));
}

#[test]
fn shares_pre_built_sheet() {
    let scope = Scope::new();
    let sheet = scope
        .engine
        .create_style_sheet(button_rules("red"), SheetOptions::new())
        .unwrap();
    let first = inject(Arc::clone(&sheet)).container();
    let second = inject(StyleDefinition::sheet(Arc::clone(&sheet))).container();

    let mut a = scope.root();
    let mut b = scope.root();
    a.render(first.element(Props::new())).unwrap();
    b.render(second.element(Props::new())).unwrap();
    assert_eq!(scope.attached(), 1);
    assert_eq!(scope.registry.len(), 1);

    a.unmount().unwrap();
    assert!(sheet.is_attached());
    assert_eq!(scope.attached(), 1);

    b.unmount().unwrap();
    assert!(!sheet.is_attached());
    assert_eq!(scope.attached(), 0);
    assert!(scope.registry.is_empty());
}

#[test]
fn shares_pre_built_sheet_across_engines() {
    let registry = SheetsRegistry::new();
    let owner = Arc::new(StyleEngine::new());
    let other = Arc::new(StyleEngine::new());
    let sheet = owner
        .create_style_sheet(button_rules("red"), SheetOptions::new())
        .unwrap();
    let first = inject(Arc::clone(&sheet)).container();
    let second = inject(Arc::clone(&sheet)).container();

    let mut a = MountPoint::with_context(RegistryContext::new(registry.clone(), Arc::clone(&owner)));
    let mut b = MountPoint::with_context(RegistryContext::new(registry.clone(), Arc::clone(&other)));
    a.render(first.element(Props::new())).unwrap();
    b.render(second.element(Props::new())).unwrap();
    assert_eq!(owner.surface().len(), 1);
    assert_eq!(registry.len(), 1);

    a.unmount().unwrap();
    assert!(sheet.is_attached());
    assert_eq!(registry.len(), 1);

    b.unmount().unwrap();
    assert!(!sheet.is_attached());
    assert!(registry.is_empty());
    assert!(owner.surface().is_empty());
    assert!(other.surface().is_empty());
}

#[test]
fn one_definition_two_wrapper_types_share_a_sheet() {
    let scope = Scope::new();
    let definition = StyleDefinition::new(button_rules("red"));
    let first = inject(definition.clone()).container();
    let second = inject(definition.clone()).container();

    let mut a = scope.root();
    let mut b = scope.root();
    a.render(first.element(Props::new())).unwrap();
    b.render(second.element(Props::new())).unwrap();
    assert_eq!(scope.attached(), 1);
    assert_eq!(scope.engine.ref_count(&definition), 2);

    a.unmount().unwrap();
    assert_eq!(scope.attached(), 1);
    b.unmount().unwrap();
    assert_eq!(scope.attached(), 0);
}

#[test]
fn equal_definitions_do_not_share() {
    let scope = Scope::new();
    let first = inject(button_rules("red")).container();
    let second = inject(button_rules("red")).container();

    let mut a = scope.root();
    let mut b = scope.root();
    a.render(first.element(Props::new())).unwrap();
    b.render(second.element(Props::new())).unwrap();
    assert_eq!(scope.attached(), 2);
}

#[test]
#[serial]
fn registry_provider_scopes_sheets() {
    default_registry().reset();
    let registry = SheetsRegistry::new();
    let first = inject(button_rules("red")).container();
    let second = inject(button_rules("blue")).container();

    let (mut a, mut b) = SheetsRegistryProvider::new(registry.clone()).provide(|| {
        let mut a = MountPoint::new();
        let mut b = MountPoint::new();
        a.render(first.element(Props::new())).unwrap();
        b.render(second.element(Props::new())).unwrap();
        (a, b)
    });

    assert_eq!(registry.len(), 2);
    assert!(default_registry().is_empty());

    a.unmount().unwrap();
    b.unmount().unwrap();
    assert!(registry.is_empty());
}

#[test]
fn factory_engine_compiles_sheets() {
    let scope = Scope::new();
    let own = Arc::new(StyleEngine::new());
    let wrapper = InjectorFactory::new()
        .with_engine(Arc::clone(&own))
        .inject(button_rules("red"), InjectOptions::new())
        .container();
    let mut root = scope.root();

    root.render(wrapper.element(Props::new())).unwrap();
    let sheet = root.instance().and_then(|i| i.sheet()).unwrap();
    assert_eq!(sheet.engine_id(), own.id());
    assert_eq!(own.surface().len(), 1);
    assert_eq!(scope.attached(), 0);
    assert_eq!(scope.registry.len(), 1);
}

#[test]
fn themed_definition_needs_a_theme() {
    let scope = Scope::new();
    let themed = StyleDefinition::themed(|theme, _| {
        RuleSet::new().rule("title", [("color", theme.get_str("primary").unwrap_or("black"))])
    });
    let wrapper = inject(themed).wrap(|props: &Props| {
        Node::text(props.theme().and_then(|t| t.name()).unwrap_or("none"))
    });

    let mut root = scope.root();
    let err = root.render(wrapper.element(Props::new())).unwrap_err();
    assert_eq!(err, SheetError::Style(StyleError::ThemeRequired));
    assert_eq!(scope.attached(), 0);

    let theme = Theme::named("ocean").set("primary", "teal");
    let output = ThemeProvider::new(theme).provide(|| {
        let ctx = RegistryContext::current()
            .with_registry(scope.registry.clone())
            .with_engine(Arc::clone(&scope.engine));
        let mut themed_root = MountPoint::with_context(ctx);
        let output = themed_root.render(wrapper.element(Props::new())).unwrap();
        assert!(scope.engine.surface().to_css().contains("color: teal"));
        themed_root.unmount().unwrap();
        output
    });
    assert_eq!(output.to_text(), "ocean");
    assert_eq!(scope.attached(), 0);
}

#[test]
fn dynamic_update_keeps_sheet_attached() {
    let scope = Scope::new();
    let styles = StyleDefinition::dynamic(|input| {
        let color = input.prop("color").and_then(|v| v.as_str()).unwrap_or("black");
        RuleSet::new().rule("label", [("color", color)])
    });
    let wrapper = inject_with(styles, InjectOptions::new().dynamic_props(["color"])).container();
    let mut root = scope.root();

    root.render(wrapper.element(Props::new().with("color", "red"))).unwrap();
    let sheet = root.instance().and_then(|i| i.sheet()).unwrap();
    let classes = sheet.classes();

    root.render(wrapper.element(Props::new().with("color", "blue"))).unwrap();
    let after = root.instance().and_then(|i| i.sheet()).unwrap();
    assert!(Arc::ptr_eq(&sheet, &after));
    assert!(after.is_attached());
    assert_eq!(after.classes(), classes);
    assert!(scope.registry.to_css().contains("color: blue"));
    assert!(!scope.registry.to_css().contains("color: red"));
}

#[test]
fn unmount_after_surface_teardown_is_tolerated() {
    let scope = Scope::new();
    let wrapper = inject(button_rules("red")).container();
    let mut root = scope.root();
    root.render(wrapper.element(Props::new())).unwrap();

    scope.engine.surface().tear_down();
    root.unmount().unwrap();
    assert_eq!(scope.engine.cached_sheets(), 0);
    assert!(scope.registry.is_empty());
}

#[test]
fn unmount_after_registry_reset_is_tolerated() {
    let scope = Scope::new();
    let wrapper = inject(button_rules("red")).container();
    let mut root = scope.root();
    root.render(wrapper.element(Props::new())).unwrap();

    scope.registry.reset();
    root.unmount().unwrap();
    assert_eq!(scope.attached(), 0);
}

#[test]
fn server_side_extraction() {
    let scope = Scope::new();
    let header = inject(RuleSet::new().rule("header", [("font-size", "2em")])).container();
    let body = inject_with(
        RuleSet::new().rule("body", [("margin", "0")]),
        InjectOptions::new().media("print"),
    )
    .container();

    let mut a = scope.root();
    let mut b = scope.root();
    a.render(header.element(Props::new())).unwrap();
    b.render(body.element(Props::new())).unwrap();

    let css = scope.registry.to_string();
    assert!(css.starts_with(".header-"));
    assert!(css.contains("@media print {"));
    assert!(css.find("font-size").unwrap() < css.find("margin").unwrap());
}
