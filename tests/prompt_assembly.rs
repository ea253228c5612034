use voidweaver::model::{EngineType, Module, ModuleName, Tag};
use voidweaver::prompt::{assemble, raw_prompt};
use voidweaver::store::ModuleStore;

#[test]
fn empty_inputs_assemble_to_empty_string() {
    let none: Vec<Module> = Vec::new();
    assert_eq!(assemble(&none, EngineType::NovelAi), "");

    let store = ModuleStore::new();
    assert_eq!(assemble(store.modules(), EngineType::NovelAi), "");
    assert_eq!(raw_prompt(store.modules()), "");
}

#[test]
fn weights_render_only_when_not_default() {
    let modules = vec![
        Module::with_tags(
            ModuleName::Style,
            vec![Tag::new("anime", 1.005), Tag::new("watercolor", 1.5)],
        ),
        Module::with_tags(ModuleName::Subject, vec![Tag::new("1girl", 0.8)]),
    ];
    assert_eq!(
        assemble(&modules, EngineType::NovelAi),
        "anime, 1.5::watercolor::, 0.8::1girl::"
    );
    assert_eq!(raw_prompt(&modules), "anime, watercolor, 1girl");
}

#[test]
fn engines_share_formatting() {
    let modules = vec![Module::with_tags(
        ModuleName::Atmosphere,
        vec![Tag::new("fog", 2.0)],
    )];
    assert_eq!(
        assemble(&modules, EngineType::NovelAi),
        assemble(&modules, EngineType::GoogleImagen)
    );
}

#[test]
fn module_order_follows_store_order_and_includes_hidden() {
    let mut store = ModuleStore::new();
    store.add_tag(ModuleName::Extra, Tag::plain("signature"));
    store.add_tag(ModuleName::Style, Tag::plain("oil painting"));
    store.add_tag(ModuleName::Pose, Tag::plain("sitting").hidden());
    assert_eq!(
        assemble(store.modules(), EngineType::NovelAi),
        "oil painting, sitting, signature"
    );
}

#[test]
fn locked_modules_still_contribute() {
    let mut store = ModuleStore::new();
    store.add_tag(ModuleName::Background, Tag::plain("city"));
    store.toggle_lock(ModuleName::Background);
    assert_eq!(assemble(store.modules(), EngineType::NovelAi), "city");
}
