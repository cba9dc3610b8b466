use mockseed_populate::HandlerRegistry;
use mockseed_populate::handlers::pack_names;

fn main() {
    let registry = HandlerRegistry::with_defaults();
    println!("packs: {}", pack_names().join(", "));
    for key in registry.global_keys() {
        println!("global {key}");
    }
}
