//! Command-line tests against a temporary data directory

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn orderdesk(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("orderdesk").unwrap();
    cmd.env("ORDERDESK_DATA_DIR", data_dir.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn init_writes_settings() {
    let data_dir = TempDir::new().unwrap();

    orderdesk(&data_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));

    assert!(data_dir.path().join("config.json").exists());
    assert!(data_dir.path().join("exports").is_dir());
}

#[test]
fn create_list_show_delete() {
    let data_dir = TempDir::new().unwrap();

    orderdesk(&data_dir)
        .args([
            "order", "create", "--customer", "Acme", "--date", "2024-05-01", "--item",
            "Widget:2:10.50", "--item", "Gadget:1:4",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created order: INV"))
        .stdout(predicate::str::contains("Grand Total: 25.00"));

    orderdesk(&data_dir)
        .args(["order", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme"))
        .stdout(predicate::str::contains("2024-05-01"))
        .stdout(predicate::str::contains("Page 1 of 1 (1 orders"));

    orderdesk(&data_dir)
        .args(["order", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Widget"))
        .stdout(predicate::str::contains("21.00"));

    orderdesk(&data_dir)
        .args(["order", "delete", "ord-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted order ord-1"));

    orderdesk(&data_dir)
        .args(["order", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No orders found."));
}

#[test]
fn update_from_json_file() {
    let data_dir = TempDir::new().unwrap();

    orderdesk(&data_dir)
        .args(["order", "create", "--customer", "Acme", "--item", "Widget:1:5"])
        .assert()
        .success();

    let payload = data_dir.path().join("order.json");
    std::fs::write(
        &payload,
        r#"{
            "customer_name": "Acme Ltd",
            "order_date": "2024-06-01",
            "products": [
                {"id": 1, "product_name": "Widget", "quantity": 3, "price": 5},
                {"id": "", "product_name": "Cable", "quantity": 2, "price": "1.25"}
            ]
        }"#,
    )
    .unwrap();

    orderdesk(&data_dir)
        .args(["order", "update", "1", "--file"])
        .arg(&payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated order"))
        .stdout(predicate::str::contains("Customer: Acme Ltd"))
        .stdout(predicate::str::contains("Grand Total: 17.50"));
}

#[test]
fn invalid_input_fails() {
    let data_dir = TempDir::new().unwrap();

    orderdesk(&data_dir)
        .args(["order", "create", "--item", "Widget:1:5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--customer is required"));

    orderdesk(&data_dir)
        .args(["order", "create", "--customer", "Acme", "--item", "Widget:0:5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quantity must be at least 1"));

    orderdesk(&data_dir)
        .args(["order", "show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Order not found: ord-42"));
}

#[test]
fn export_run_list_and_download() {
    let data_dir = TempDir::new().unwrap();

    orderdesk(&data_dir)
        .args(["seed", "--count", "3", "--date", "2024-05-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 3 orders"));

    let output = orderdesk(&data_dir)
        .args(["export", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 orders"))
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    let file_name = stdout
        .split_whitespace()
        .find(|word| word.starts_with("orders_export_"))
        .unwrap()
        .to_string();

    orderdesk(&data_dir)
        .args(["export", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(file_name.as_str()));

    let target = data_dir.path().join("copy.xlsx");
    orderdesk(&data_dir)
        .args(["export", "download", &file_name, "--output"])
        .arg(&target)
        .assert()
        .success();
    assert_eq!(
        std::fs::read(&target).unwrap(),
        std::fs::read(data_dir.path().join("exports").join(&file_name)).unwrap()
    );

    orderdesk(&data_dir)
        .args(["export", "download", "../data/orders.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid file name"));
}
