#![allow(dead_code)]

use std::{fs, path::Path};

use serde_json::{json, Value};
use tempfile::TempDir;

pub const ANA_EMAIL: &str = "ana@example.com";

/// Users collection shared by the integration suites.
pub fn sample_users() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "email": "luis@example.com",
            "name": "Luis Quispe",
            "cardNumber": "5500000000000004",
            "expirationDate": "01/26",
            "cvc": "999"
        }),
        json!({
            "id": 7,
            "email": ANA_EMAIL,
            "name": "Ana Torres",
            "password": "hunter22",
            "phoneNumber": "+51 999 888 777",
            "address": "Av. Sol 123",
            "city": "Cusco",
            "region": "Cusco",
            "country": "Chile",
            "cardNumber": "4111111111111111",
            "expirationDate": "09/27",
            "cvc": "123",
            "role": "customer"
        }),
    ]
}

/// Temporary app home whose `db.json` holds [`sample_users`].
pub fn seeded_home() -> TempDir {
    let home = TempDir::new().expect("create temp dir");
    write_database(home.path(), &sample_users());
    home
}

pub fn write_database(home: &Path, users: &[Value]) {
    let database = json!({ "users": users });
    fs::write(
        home.join("db.json"),
        serde_json::to_string_pretty(&database).expect("serialize database"),
    )
    .expect("write db.json");
}

pub fn read_users(home: &Path) -> Vec<Value> {
    let data = fs::read_to_string(home.join("db.json")).expect("read db.json");
    let database: Value = serde_json::from_str(&data).expect("parse db.json");
    database["users"].as_array().cloned().unwrap_or_default()
}

pub fn user_by_id(home: &Path, id: u64) -> Value {
    read_users(home)
        .into_iter()
        .find(|user| user["id"] == json!(id))
        .expect("user present")
}
