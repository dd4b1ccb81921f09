//! End-to-end order workflow against the on-disk store

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use orderdesk::config::OrderdeskPaths;
use orderdesk::export::{CancelToken, ExportService};
use orderdesk::models::{LineItemInput, Money, OrderInput};
use orderdesk::services::{OrderQuery, OrderTransactionService};
use orderdesk::storage::{ArtifactStore, Datastore, FsArtifactStore, LineItemStore, Storage};
use orderdesk::ErrorKind;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn noon(d: u32) -> NaiveDateTime {
    day(d).and_hms_opt(12, 0, 0).unwrap()
}

fn open(temp_dir: &TempDir) -> (Storage, FsArtifactStore) {
    let paths = OrderdeskPaths::with_base_dir(temp_dir.path().to_path_buf());
    let artifacts = FsArtifactStore::new(paths.exports_dir());
    (Storage::new(paths).unwrap(), artifacts)
}

fn two_items(customer: &str) -> OrderInput {
    OrderInput::new(customer, day(1))
        .with_item(LineItemInput::new("Widget", 2, Money::from_cents(1050)))
        .with_item(LineItemInput::new("Gadget", 3, Money::from_cents(199)))
}

#[test]
fn concurrent_creates_get_distinct_numbers() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, _) = open(&temp_dir);
    let service = OrderTransactionService::new(&storage);

    let numbers: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let service = &service;
                scope.spawn(move || {
                    service
                        .create_on(&two_items(&format!("Customer {}", n)), day(1))
                        .unwrap()
                        .order_no
                        .to_string()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let distinct: HashSet<_> = numbers.iter().collect();
    assert_eq!(distinct.len(), 8);
    for sequence in 1..=8 {
        assert!(numbers.contains(&format!("INV20240501{:04}", sequence)));
    }
}

#[test]
fn grand_total_matches_line_items_after_every_write() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, _) = open(&temp_dir);
    let service = OrderTransactionService::new(&storage);

    let order = service.create_on(&two_items("Acme"), day(1)).unwrap();
    assert_eq!(order.grand_total, Money::from_cents(2 * 1050 + 3 * 199));

    let items = service.find(order.id).unwrap().line_items;
    let edit = OrderInput::new("Acme", day(1))
        .with_item(LineItemInput::existing(items[1].id, "Gadget", 1, Money::from_cents(199)));
    let updated = service.update(order.id, &edit).unwrap();

    let stored_sum: Money = storage
        .read(|repos| repos.line_items_of(order.id))
        .unwrap()
        .iter()
        .map(|item| item.subtotal)
        .sum();
    assert_eq!(updated.grand_total, stored_sum);
    assert_eq!(updated.grand_total, Money::from_cents(199));
}

#[test]
fn pagination_over_twenty_five_orders() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, _) = open(&temp_dir);
    let service = OrderTransactionService::new(&storage);
    for n in 0..25 {
        service
            .create_on(&OrderInput::new(format!("C{}", n), day(1)), day(1))
            .unwrap();
    }

    let page = service.list(&OrderQuery::new().page(3).per_page(10)).unwrap();
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total, 25);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.current_page, 3);

    let beyond = service.list(&OrderQuery::new().page(4).per_page(10)).unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 25);
}

#[test]
fn data_survives_reopening_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let order_id = {
        let (storage, _) = open(&temp_dir);
        let service = OrderTransactionService::new(&storage);
        service.create_on(&two_items("Acme"), day(1)).unwrap().id
    };

    let (storage, _) = open(&temp_dir);
    let service = OrderTransactionService::new(&storage);
    let detail = service.find(order_id).unwrap();
    assert_eq!(detail.order.customer_name, "Acme");
    assert_eq!(detail.line_items.len(), 2);

    // The sequence continues from the persisted orders
    let next = service.create_on(&two_items("Globex"), day(1)).unwrap();
    assert_eq!(next.order_no.to_string(), "INV202405010002");
}

#[test]
fn failed_update_leaves_store_unchanged_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, _) = open(&temp_dir);
    let service = OrderTransactionService::new(&storage);
    let mine = service.create_on(&two_items("Mine"), day(1)).unwrap();
    let theirs = service.create_on(&two_items("Theirs"), day(1)).unwrap();
    let foreign = service.find(theirs.id).unwrap().line_items[0].id;

    let edit = OrderInput::new("Renamed", day(9))
        .with_item(LineItemInput::existing(foreign, "Stolen", 1, Money::zero()));
    let err = service.update(mine.id, &edit).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let (reopened, _) = open(&temp_dir);
    let service = OrderTransactionService::new(&reopened);
    assert_eq!(service.find(mine.id).unwrap().order.customer_name, "Mine");
}

#[test]
fn delete_removes_order_and_line_items() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, _) = open(&temp_dir);
    let service = OrderTransactionService::new(&storage);
    let order = service.create_on(&two_items("Acme"), day(1)).unwrap();
    let item_id = service.find(order.id).unwrap().line_items[0].id;

    service.delete(order.id).unwrap();

    assert_eq!(service.find(order.id).unwrap_err().kind(), ErrorKind::NotFound);
    assert!(storage
        .read(|repos| repos.find_line_item(item_id))
        .unwrap_err()
        .is_not_found());
    assert_eq!(service.delete(order.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn export_writes_both_sheets_and_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, artifacts) = open(&temp_dir);
    let orders = OrderTransactionService::new(&storage);
    for name in ["Acme", "Globex", "Initech"] {
        orders.create_on(&two_items(name), day(1)).unwrap();
    }

    let exports = ExportService::new(&storage, &artifacts);
    let summary = exports.export_at(noon(1), &CancelToken::new()).unwrap();
    assert_eq!(summary.file_name, "orders_export_20240501_120000.xlsx");
    assert_eq!(summary.order_rows, 3);
    assert_eq!(summary.line_item_rows, 6);

    let bytes = exports.download(&summary.file_name).unwrap();
    assert_eq!(bytes, artifacts.get(&summary.file_name).unwrap());

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
    let sheet = workbook.worksheet_range("Orders").unwrap();
    assert_eq!(sheet.height(), 4);
    assert_eq!(sheet.get((1, 1)), Some(&Data::String("Acme".into())));
    assert_eq!(sheet.get((1, 2)), Some(&Data::String("01-05-2024".into())));

    let sheet = workbook.worksheet_range("Order Product").unwrap();
    assert_eq!(sheet.height(), 7);
    assert_eq!(sheet.get((0, 4)), Some(&Data::String("Subtotal".into())));
    assert_eq!(sheet.get((1, 0)), Some(&Data::String("INV202405010001".into())));
    assert_eq!(sheet.get((1, 4)), Some(&Data::Float(21.0)));

    assert_eq!(
        exports.download("orders_export_19990101_000000.xlsx").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn cancelled_export_leaves_no_file() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, artifacts) = open(&temp_dir);
    OrderTransactionService::new(&storage)
        .create_on(&two_items("Acme"), day(1))
        .unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let exports = ExportService::new(&storage, &artifacts);
    let err = exports.export_at(noon(1), &cancel).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(exports.list().unwrap().is_empty());
}

#[test]
fn repeated_exports_are_pruned() {
    let temp_dir = TempDir::new().unwrap();
    let (storage, artifacts) = open(&temp_dir);
    let exports = ExportService::new(&storage, &artifacts);

    for d in [1, 2, 8] {
        exports.export_at(noon(d), &CancelToken::new()).unwrap();
    }
    assert_eq!(exports.list().unwrap().len(), 3);

    // Exports from the 1st and 2nd are past the seven day limit by the 13th
    let summary = exports.export_at(noon(13), &CancelToken::new()).unwrap();
    assert_eq!(summary.pruned.len(), 2);
    let names: Vec<_> = exports.list().unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        vec![
            "orders_export_20240513_120000.xlsx".to_string(),
            "orders_export_20240508_120000.xlsx".to_string(),
        ]
    );
}
