use stockroom_core::db::open_db_in_memory;
use stockroom_core::{
    Context, Item, ItemPageQuery, ItemRepository, SqliteDocumentStore, StoreItemRepository,
    DEFAULT_PAGE_SIZE,
};

fn item(id: &str, owner_id: &str, name: &str) -> Item {
    Item::new(id, owner_id, name)
}

#[test]
fn listing_an_empty_collection_returns_no_items_and_no_token() {
    let conn = open_db_in_memory().unwrap();
    let repo = StoreItemRepository::new(SqliteDocumentStore::new(&conn));
    let ctx = Context::background();

    let page = repo.list(&ctx, &ItemPageQuery::with_page_size(2)).unwrap();
    assert!(page.items.is_empty());
    assert!(page.next_token.is_none());
}

#[test]
fn three_items_page_through_in_ascending_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = StoreItemRepository::new(SqliteDocumentStore::new(&conn));
    let ctx = Context::background();

    // Insert out of order; pagination follows id order, not insert order.
    repo.insert_bulk(
        &ctx,
        &[
            item("c", "owner-1", "Cart"),
            item("a", "owner-1", "Anvil"),
            item("b", "owner-2", "Bolt"),
        ],
    )
    .unwrap();

    let query = ItemPageQuery::with_page_size(2);
    let first = repo.list(&ctx, &query).unwrap();
    assert_eq!(ids(&first.items), vec!["a", "b"]);
    assert_eq!(first.next_token.as_deref(), Some("b"));

    let second = repo.list(&ctx, &query.after("b")).unwrap();
    assert_eq!(ids(&second.items), vec!["c"]);
    assert_eq!(second.next_token.as_deref(), Some("c"));

    let third = repo.list(&ctx, &query.after("c")).unwrap();
    assert!(third.items.is_empty());
    assert!(third.next_token.is_none());
}

#[test]
fn non_positive_page_size_falls_back_to_ten() {
    let conn = open_db_in_memory().unwrap();
    let repo = StoreItemRepository::new(SqliteDocumentStore::new(&conn));
    let ctx = Context::background();

    let items: Vec<Item> = (0..15)
        .map(|n| item(&format!("item-{n:02}"), "owner-1", "Widget"))
        .collect();
    repo.insert_bulk(&ctx, &items).unwrap();

    for page_size in [0, -5] {
        let page = repo
            .list(&ctx, &ItemPageQuery::with_page_size(page_size))
            .unwrap();
        assert_eq!(page.items.len() as i64, DEFAULT_PAGE_SIZE);
    }
}

#[test]
fn walking_all_pages_yields_the_full_set_once_in_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = StoreItemRepository::new(SqliteDocumentStore::new(&conn));
    let ctx = Context::background();

    let items: Vec<Item> = (0..23)
        .map(|n| item(&format!("item-{n:02}"), "owner-1", "Widget"))
        .collect();
    repo.insert_bulk(&ctx, &items).unwrap();

    let mut query = ItemPageQuery::with_page_size(4);
    let mut collected = Vec::new();
    loop {
        let page = repo.list(&ctx, &query).unwrap();
        if page.items.is_empty() {
            assert!(page.next_token.is_none());
            break;
        }
        collected.extend(ids(&page.items));
        query = query.after(page.next_token.unwrap());
    }

    let expected: Vec<String> = (0..23).map(|n| format!("item-{n:02}")).collect();
    assert_eq!(collected, expected);
}

#[test]
fn pages_are_strictly_ascending_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = StoreItemRepository::new(SqliteDocumentStore::new(&conn));
    let ctx = Context::background();

    repo.insert_bulk(
        &ctx,
        &[
            item("zeta", "owner-1", "Zinc"),
            item("alpha", "owner-1", "Anvil"),
            item("mid", "owner-1", "Mesh"),
        ],
    )
    .unwrap();

    let page = repo.list(&ctx, &ItemPageQuery::with_page_size(10)).unwrap();
    let listed = ids(&page.items);
    for pair in listed.windows(2) {
        assert!(pair[0] < pair[1], "ids not strictly ascending: {listed:?}");
    }
}

#[test]
fn list_by_owner_only_returns_that_owners_items() {
    let conn = open_db_in_memory().unwrap();
    let repo = StoreItemRepository::new(SqliteDocumentStore::new(&conn));
    let ctx = Context::background();

    repo.insert_bulk(
        &ctx,
        &[
            item("a", "owner-1", "Anvil"),
            item("b", "owner-2", "Bolt"),
            item("c", "owner-1", "Cart"),
            item("d", "owner-2", "Drill"),
            item("e", "owner-1", "Easel"),
        ],
    )
    .unwrap();

    let query = ItemPageQuery::with_page_size(2);
    let first = repo.list_by_owner(&ctx, "owner-1", &query).unwrap();
    assert_eq!(ids(&first.items), vec!["a", "c"]);
    assert_eq!(first.next_token.as_deref(), Some("c"));

    let second = repo
        .list_by_owner(&ctx, "owner-1", &query.after("c"))
        .unwrap();
    assert_eq!(ids(&second.items), vec!["e"]);

    let third = repo
        .list_by_owner(&ctx, "owner-1", &query.after("e"))
        .unwrap();
    assert!(third.items.is_empty());
    assert!(third.next_token.is_none());
}

#[test]
fn list_by_owner_with_unknown_owner_is_empty_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = StoreItemRepository::new(SqliteDocumentStore::new(&conn));
    let ctx = Context::background();

    repo.insert_bulk(&ctx, &[item("a", "owner-1", "Anvil")])
        .unwrap();

    let page = repo
        .list_by_owner(&ctx, "nobody", &ItemPageQuery::with_page_size(5))
        .unwrap();
    assert!(page.items.is_empty());
    assert!(page.next_token.is_none());
}

fn ids(items: &[Item]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}
