use paging_core::{Page, PageCursor, SpringPage};

#[test]
fn spring_envelope_middle_page_has_next_cursor() {
    let json = r#"{
        "content": ["a", "b"],
        "totalElements": 5,
        "totalPages": 3,
        "number": 0,
        "size": 2,
        "last": false
    }"#;

    let envelope: SpringPage<String> = serde_json::from_str(json).unwrap();
    let page: Page<String> = envelope.into();

    assert_eq!(page.items, vec!["a", "b"]);
    assert_eq!(page.next_cursor, Some(PageCursor::from_page_number(1)));
    assert_eq!(page.total_elements, Some(5));
    assert_eq!(page.total_pages, Some(3));
}

#[test]
fn spring_envelope_last_page_has_no_cursor() {
    let json = r#"{"content": [1], "totalElements": 5, "totalPages": 3, "number": 2, "size": 2, "last": true}"#;
    let page = serde_json::from_str::<SpringPage<u32>>(json)
        .unwrap()
        .into_page();
    assert!(!page.has_more());
}

#[test]
fn spring_envelope_defaults_to_single_last_page() {
    let envelope: SpringPage<u32> = serde_json::from_str("{}").unwrap();
    assert!(envelope.content.is_empty());
    assert!(envelope.last);
    assert_eq!(envelope.into_page().next_cursor, None);
}

#[test]
fn spring_envelope_without_totals_leaves_them_unknown() {
    let json = r#"{"content": [1, 2], "number": 0, "last": false}"#;
    let page = serde_json::from_str::<SpringPage<u32>>(json)
        .unwrap()
        .into_page();
    assert_eq!(page.total_elements, None);
    assert_eq!(page.total_pages, None);
    assert_eq!(page.next_cursor, Some(PageCursor::from_page_number(1)));
}

#[test]
fn spring_envelope_at_max_page_number_has_no_cursor() {
    let json = format!(r#"{{"content": [1], "number": {}, "last": false}}"#, u32::MAX);
    let page = serde_json::from_str::<SpringPage<u32>>(&json)
        .unwrap()
        .into_page();
    assert_eq!(page.next_cursor, None);
}
