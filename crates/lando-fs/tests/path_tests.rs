use lando_fs::NormalizedPath;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case("/plugins/php", "./components/engine.yml", "/plugins/php/components/engine.yml")]
#[case("/plugins/php", "../shared/hook.yml", "/plugins/shared/hook.yml")]
#[case("/plugins/php", "/abs/task.yml", "/abs/task.yml")]
#[case("/plugins/php/", "tasks//init.yml", "/plugins/php/tasks/init.yml")]
fn test_resolve_locator(#[case] origin: &str, #[case] locator: &str, #[case] expected: &str) {
    assert_eq!(NormalizedPath::resolve(origin, locator).as_str(), expected);
}

#[test]
fn test_join_resolves_dots() {
    let base = NormalizedPath::new("/a/b");

    assert_eq!(base.join("c").as_str(), "/a/b/c");
    assert_eq!(base.join("./c").as_str(), "/a/b/c");
    assert_eq!(base.join("../c").as_str(), "/a/c");
    assert_eq!(base.join("../../../c").as_str(), "/c");
}

#[test]
fn test_extension_and_file_name() {
    let path = NormalizedPath::new("/home/me/.lando/config.yml");
    assert_eq!(path.file_name(), Some("config.yml"));
    assert_eq!(path.extension(), Some("yml"));
    assert_eq!(NormalizedPath::new("/home/me/.lando").extension(), None);
}

proptest! {
    #[test]
    fn test_normalization_invariants(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        let as_str = path.as_str();

        prop_assert!(!as_str.contains('\\'));
        prop_assert!(!as_str.contains("//"));
        prop_assert!(!as_str.split('/').any(|seg| seg == ".."));

        // Normalizing twice changes nothing
        let again = NormalizedPath::new(as_str);
        prop_assert_eq!(path, again);
    }
}
