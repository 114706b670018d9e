use taskpaper_core::{Item, TagError};

fn pairs(item: &Item) -> Vec<(String, String)> {
    item.tags()
        .into_iter()
        .map(|tag| (tag.name, tag.value))
        .collect()
}

fn expected(tags: &[(&str, &str)]) -> Vec<(String, String)> {
    tags.iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[test]
fn tag_parsing_examples() {
    let cases: &[(&str, &[(&str, &str)])] = &[
        ("lorem ipsum", &[]),
        ("hello @world", &[("world", "")]),
        ("foo @bar baz", &[("bar", "")]),
        ("foo @bar(baz)", &[("bar", "baz")]),
        ("quick @brown(fox) @jumps", &[("brown", "fox"), ("jumps", "")]),
        ("alphabet @ÁßçDēFgHį", &[("ÁßçDēFgHį", "")]),
        ("Tag is right at the end @hello", &[("hello", "")]),
        ("@hello(world) Another tag right at the start", &[("hello", "world")]),
        ("company @client(hogbay software)", &[("client", "hogbay software")]),
    ];
    for (text, tags) in cases {
        assert_eq!(pairs(&Item::new(*text)), expected(tags), "text: {text}");
    }
}

#[test]
fn tag_followed_by_nonsense_is_ignored() {
    for text in [
        "hello world @tag)",
        "hello world @tag())",
        "hello world @tag(value)a",
        "hello world @tag(value)extra)",
        "hello world @tag,",
        "hello (@tag)",
        "mail bob@example.com",
    ] {
        assert!(Item::new(text).tags().is_empty(), "text: {text}");
    }
}

#[test]
fn escaped_paren_stays_inside_value() {
    let mut item = Item::new("x");
    item.add_tag("note", r"a\)b").unwrap();
    assert_eq!(item.to_string(), r"x @note(a\)b)");
    assert_eq!(item.tag("note").unwrap(), r"a\)b");
}

#[test]
fn trailing_backslash_values_are_rejected_without_touching_other_tags() {
    for value in [r"v\", r"\", r"v\\"] {
        let mut item = Item::new("x @a(1) @b(2)");
        assert_eq!(
            item.add_tag("a", value).unwrap_err(),
            TagError::InvalidTagValue(value.to_string())
        );
        assert!(matches!(
            item.tags_mut().insert("c", value),
            Err(TagError::InvalidTagValue(_))
        ));
        assert_eq!(item.to_string(), "x @a(1) @b(2)");
        assert_eq!(pairs(&item), expected(&[("a", "1"), ("b", "2")]));
    }

    let mut done = Item::new("x @done(2020)");
    assert!(done.add_tag("a", r"v\").is_err());
    assert!(done.done());
    assert_eq!(done.done_date().unwrap(), "2020");
}

#[test]
fn escaped_paren_value_keeps_following_tags() {
    let mut item = Item::new("x");
    item.tags_mut().insert("a", r"v\)").unwrap();
    item.tags_mut().insert("b", "2").unwrap();
    assert_eq!(item.to_string(), r"x @a(v\)) @b(2)");

    let reparsed = Item::new(item.to_string());
    assert_eq!(pairs(&reparsed), expected(&[("a", r"v\)"), ("b", "2")]));
}

#[test]
fn add_tag_scenario_keeps_done_last() {
    let mut item = Item::new("hello world");
    item.add_tag("done", "now").unwrap();
    assert_eq!(item.to_string(), "hello world @done(now)");

    item.add_tag("foo", "bar").unwrap();
    assert_eq!(item.to_string(), "hello world @foo(bar) @done(now)");
}

#[test]
fn set_rewrites_existing_tag_in_place() {
    let mut item = Item::new("I am a test @hello(world) @foo(bar) @baz");
    item.tags_mut().set("hello", "new_value").unwrap();
    assert_eq!(item.to_string(), "I am a test @hello(new_value) @foo(bar) @baz");

    item.tags_mut().set("baz", "").unwrap();
    assert_eq!(item.to_string(), "I am a test @hello(new_value) @foo(bar) @baz");

    item.tags_mut().set("blue", "aquamarine").unwrap();
    assert_eq!(
        pairs(&item),
        expected(&[
            ("hello", "new_value"),
            ("foo", "bar"),
            ("baz", ""),
            ("blue", "aquamarine"),
        ])
    );
}

#[test]
fn lookup_and_inclusion() {
    let mut item = Item::new("I am a test @hello(world) @foo(bar) @baz");
    let tags = item.tags_mut();
    for name in ["hello", "foo", "baz"] {
        assert!(tags.contains(name));
    }
    assert!(!tags.contains("lorem"));
    assert!(tags.contains_tag("hello", "world"));
    assert!(!tags.contains_tag("hello", "there"));
    assert_eq!(tags.get("foo").unwrap(), "bar");
    assert_eq!(tags.get("baz").unwrap(), "");
    assert_eq!(
        tags.get("lorem").unwrap_err(),
        TagError::NoSuchTag("lorem".to_string())
    );
    assert_eq!(tags.len(), 3);
}

#[test]
fn insert_allows_duplicates_and_remove_filters_by_value() {
    let mut item = Item::new("I am a test");
    {
        let mut tags = item.tags_mut();
        tags.insert("hello", "").unwrap();
        tags.insert("foo", "bar").unwrap();
        tags.insert("company", "hogbay software").unwrap();
        tags.insert("foo", "baz").unwrap();
    }
    assert_eq!(
        pairs(&item),
        expected(&[
            ("hello", ""),
            ("foo", "bar"),
            ("company", "hogbay software"),
            ("foo", "baz"),
        ])
    );
    assert_eq!(item.tag("foo").unwrap(), "baz");
    assert_eq!(
        item.tags_mut().entries(),
        expected(&[("hello", ""), ("foo", "baz"), ("company", "hogbay software")])
    );

    assert_eq!(item.remove_tag("foo", None), 2);
    assert_eq!(
        pairs(&item),
        expected(&[("hello", ""), ("company", "hogbay software")])
    );

    item.tags_mut().insert("company", "apple inc").unwrap();
    assert_eq!(item.remove_tag("company", Some("hogbay software")), 1);
    assert_eq!(item.to_string(), "I am a test @hello @company(apple inc)");
    assert_eq!(item.remove_tag("missing", None), 0);
}

#[test]
fn delete_removes_every_occurrence_with_its_whitespace() {
    let mut item = Item::new("a @x(1) b @x(2)");
    item.tags_mut().delete("x").unwrap();
    assert_eq!(item.to_string(), "a b");

    let mut leading = Item::new("@hello Tag is at the very start");
    leading.tags_mut().delete("hello").unwrap();
    assert_eq!(leading.to_string(), "Tag is at the very start");
}

#[test]
fn delete_missing_tag_fails_without_touching_text() {
    let mut item = Item::new("buy milk @home");
    let err = item.tags_mut().delete("work").unwrap_err();
    assert_eq!(err, TagError::NoSuchTag("work".to_string()));
    assert!(err.to_string().contains("work"));
    assert_eq!(item.to_string(), "buy milk @home");
}

#[test]
fn invalid_names_and_values_are_rejected() {
    let mut item = Item::new("buy milk");
    assert!(matches!(
        item.add_tag("due", "fri)day"),
        Err(TagError::InvalidTagValue(value)) if value == "fri)day"
    ));
    assert!(matches!(
        item.add_tag("bad name", ""),
        Err(TagError::InvalidTag(name)) if name == "bad name"
    ));
    assert!(matches!(item.add_tag("", "x"), Err(TagError::InvalidTag(_))));
    assert!(matches!(
        item.tags_mut().insert("ok", "two\nlines"),
        Err(TagError::InvalidTagValue(_))
    ));
    assert_eq!(item.to_string(), "buy milk");
}

#[test]
fn duplicate_done_tags_collapse_to_the_last_one() {
    let mut item = Item::new("x @done(a) @done(b)");
    item.add_tag("foo", "").unwrap();
    assert_eq!(item.to_string(), "x @foo @done(b)");

    let mut replaced = Item::new("task @done(old)");
    replaced.tags_mut().insert("done", "new").unwrap();
    assert_eq!(replaced.to_string(), "task @done(new)");
}

#[test]
fn done_in_the_middle_moves_behind_other_tags_on_mutation() {
    let mut item = Item::new("- call mom @done(2016-01-01) @phone");
    item.tags_mut().set("phone", "mobile").unwrap();
    assert_eq!(
        item.to_string(),
        "- call mom @phone(mobile) @done(2016-01-01)"
    );
}

#[test]
fn indentation_survives_tag_removal() {
    let mut item = Item::new("\t@today - buy milk");
    item.tags_mut().delete("today").unwrap();
    assert_eq!(item.to_string(), "\t- buy milk");
}
