use anyhow::Result;
use serde_json::{json, Value};

use crate::config::AdminCredentials;
use crate::model::Id;
use crate::store::traits::{Collection, Store};

const CONSUMERS: [(&str, &str, &str); 18] = [
    ("Ava", "Smith", "Oranjestad"),
    ("Liam", "Croes", "Noord"),
    ("Mia", "Smithson", "Paradera"),
    ("Noah", "Geerman", "Santa Cruz"),
    ("Emma", "Kock", "Savaneta"),
    ("Lucas", "Tromp", "San Nicolas"),
    ("Sofia", "Werleman", "Oranjestad"),
    ("Mateo", "Maduro", "Noord"),
    ("Isabella", "Arends", "Paradera"),
    ("Daniel", "Ras", "Santa Cruz"),
    ("Olivia", "Lacle", "Savaneta"),
    ("Elijah", "Dijkhoff", "San Nicolas"),
    ("Chloe", "Hassell", "Oranjestad"),
    ("Samuel", "Wever", "Noord"),
    ("Zoe", "Figaroa", "Paradera"),
    ("Gabriel", "Kelly", "Santa Cruz"),
    ("Nina", "Vrolijk", "Savaneta"),
    ("Ruben", "Oduber", "San Nicolas"),
];

/// Business names double as the category tabs of the reward and redeem pages
const BUSINESSES: [(&str, &str, f64); 5] = [
    ("Supermarket", "per_4_packs", 10.0),
    ("Rumshop/Small Store", "per_4_packs", 8.0),
    ("Wholesaler", "per_case", 25.0),
    ("Bar/Restaurant", "per_bottle", 2.0),
    ("Harbour Duty Free", "per_case", 30.0),
];

const REWARDS: [(&str, usize, i64, &str); 7] = [
    ("Guinness Cap", 0, 150, "merchandise"),
    ("Guinness T-Shirt", 0, 300, "merchandise"),
    ("Free Pint", 3, 80, "drink"),
    ("Bucket Deal", 3, 450, "drink"),
    ("Cooler Bag", 1, 600, "merchandise"),
    ("Case Discount", 2, 900, "voucher"),
    ("Airport Tote", 4, 350, "merchandise"),
];

/// Deterministic 24-hex document ids; the leading digit names the collection
pub fn seed_id(collection: Collection, index: usize) -> Id {
    let digit = match collection {
        Collection::Users => 1,
        Collection::Businesses => 2,
        Collection::Rewards => 3,
        Collection::Redeems => 4,
        Collection::BusinessDetails => 5,
        Collection::History => 6,
        Collection::Receipts => 7,
    };
    format!("{digit}{index:023x}")
}

pub fn admin_id() -> Id {
    seed_id(Collection::Users, 0)
}

/// A reward that points at a business that no longer exists
pub fn orphan_reward_id() -> Id {
    seed_id(Collection::Rewards, 99)
}

fn day(offset: usize) -> String {
    format!("2024-03-{:02}T{:02}:15:00Z", 1 + offset % 28, 8 + offset % 12)
}

/// Populate an empty store with a small loyalty programme
pub async fn load_seed_data<S: Store>(store: &S, admin: &AdminCredentials) -> Result<()> {
    load_users(store, admin).await?;
    load_businesses(store).await?;
    load_rewards(store).await?;
    load_redeems(store).await?;
    load_business_details(store).await?;
    load_history(store).await?;
    load_receipts(store).await?;
    Ok(())
}

async fn load_users<S: Store>(store: &S, admin: &AdminCredentials) -> Result<()> {
    store
        .insert_document(
            Collection::Users,
            json!({
                "_id": admin_id(),
                "firstName": "Guinness",
                "lastName": "Admin",
                "email": admin.email,
                "password": admin.password,
                "role": "admin",
                "status": "active",
                "createdAt": day(0),
            }),
        )
        .await?;

    for (index, (first, last, town)) in CONSUMERS.iter().enumerate() {
        let email = format!("{}.{}@mail.aw", first.to_lowercase(), last.to_lowercase());
        store
            .insert_document(
                Collection::Users,
                json!({
                    "_id": seed_id(Collection::Users, index + 1),
                    "firstName": first,
                    "lastName": last,
                    "email": email,
                    "phone": format!("+297 56{:05}", index * 137),
                    "role": "consumer",
                    "age": 21 + index as u32 * 2,
                    "location": town,
                    "status": if index % 7 == 6 { "blocked" } else { "active" },
                    "points": (index as i64 + 1) * 40,
                    "createdAt": day(index),
                }),
            )
            .await?;
    }

    for index in 0..4 {
        let approved = index < 2;
        let name = ["Eagle Beach Bar", "Palm Market", "Sunset Liquor", "Baby Beach Snack"][index];
        let kind = ["Bar/Restaurant", "Supermarket", "Rumshop/Small Store", "Bar/Restaurant"][index];
        let first_name = ["Carlos", "Maria", "Jose", "Ana"][index];
        let last_name = ["Boekhoudt", "Lopez", "Ponson", "Rasmijn"][index];
        store
            .insert_document(
                Collection::Users,
                json!({
                    "_id": business_user_id(index),
                    "firstName": first_name,
                    "lastName": last_name,
                    "email": format!("owner{}@business.aw", index + 1),
                    "phone": format!("+297 58{:05}", index * 911),
                    "role": "business",
                    "status": "active",
                    "businessInfo": {
                        "businessName": name,
                        "businessType": kind,
                        "registrationNumber": format!("KVK-{:05}", 1200 + index),
                        "ownerName": format!("Owner {}", index + 1),
                        "phone": format!("+297 52{:05}", index * 313),
                        "email": format!("hello{}@business.aw", index + 1),
                        "address": format!("L.G. Smith Blvd {}", 10 + index * 7),
                        "taxId": format!("TX{:06}", 44_000 + index),
                        "approvedByAdmin": approved,
                    },
                    "createdAt": day(20 + index),
                }),
            )
            .await?;
    }
    Ok(())
}

/// Business accounts occupy user slots 30 and up
pub fn business_user_id(index: usize) -> Id {
    seed_id(Collection::Users, 30 + index)
}

async fn load_businesses<S: Store>(store: &S) -> Result<()> {
    for (index, (name, earn_type, value)) in BUSINESSES.iter().enumerate() {
        store
            .insert_document(
                Collection::Businesses,
                json!({
                    "_id": seed_id(Collection::Businesses, index),
                    "name": name,
                    "description": format!("{name} partner programme"),
                    "earnPoints": {"type": earn_type, "value": value},
                    "method": if index % 2 == 0 { "upload_receipt" } else { "scan_qr" },
                    "isActive": index != 4,
                    "createdAt": day(index),
                }),
            )
            .await?;
    }
    Ok(())
}

async fn load_rewards<S: Store>(store: &S) -> Result<()> {
    for (index, (name, business, points, kind)) in REWARDS.iter().enumerate() {
        store
            .insert_document(
                Collection::Rewards,
                json!({
                    "_id": seed_id(Collection::Rewards, index),
                    "business": seed_id(Collection::Businesses, *business),
                    "rewardName": name,
                    "pointsRequired": points,
                    "rewardType": kind,
                    "image": format!("/uploads/rewards/{}.png", index + 1),
                    "isActive": index % 4 != 3,
                    "createdAt": day(index + 2),
                }),
            )
            .await?;
    }
    store
        .insert_document(
            Collection::Rewards,
            json!({
                "_id": orphan_reward_id(),
                "business": seed_id(Collection::Businesses, 77),
                "rewardName": "Legacy Keychain",
                "pointsRequired": 50,
                "rewardType": "merchandise",
                "isActive": false,
                "createdAt": day(1),
            }),
        )
        .await?;
    Ok(())
}

async fn load_redeems<S: Store>(store: &S) -> Result<()> {
    for index in 0..6 {
        let reward = index % REWARDS.len();
        let (_, business, points, _) = REWARDS[reward];
        store
            .insert_document(
                Collection::Redeems,
                json!({
                    "_id": seed_id(Collection::Redeems, index),
                    "user": seed_id(Collection::Users, index + 1),
                    "reward": seed_id(Collection::Rewards, reward),
                    "business": seed_id(Collection::Businesses, business),
                    "pointsUsed": points,
                    "status": if index % 2 == 0 { "pending" } else { "delivered" },
                    "redeemCode": format!("GN-{:04}", 3100 + index),
                    "createdAt": day(index + 5),
                }),
            )
            .await?;
    }
    Ok(())
}

async fn load_business_details<S: Store>(store: &S) -> Result<()> {
    for index in 0..2 {
        store
            .insert_document(
                Collection::BusinessDetails,
                json!({
                    "_id": seed_id(Collection::BusinessDetails, index),
                    "business": seed_id(Collection::Businesses, index),
                    "title": format!("{} Summer Promo", BUSINESSES[index].0),
                    "summaryStats": [
                        {"label": "Participants", "value": 120 + index * 30},
                        {"label": "Prizes", "value": 12},
                    ],
                    "grandPrize": {
                        "title": "Trip to Dublin",
                        "description": "Two tickets and a brewery tour",
                        "drawDate": "2024-08-31",
                        "entryRule": "One entry per 100 points",
                    },
                    "earnPerPurchase": [
                        {"productName": "Guinness Draught", "size": "4-pack", "points": 10, "entries": 1},
                        {"productName": "Guinness Foreign Extra", "size": "case", "points": 25, "entries": 3, "bonusTip": "Double on Fridays"},
                    ],
                    "isActive": index == 0,
                    "createdAt": day(index + 10),
                }),
            )
            .await?;
    }
    Ok(())
}

async fn load_history<S: Store>(store: &S) -> Result<()> {
    let actions = ["qr_code_create", "qr_scan", "receipt_upload"];
    for index in 0..9 {
        let action = actions[index % actions.len()];
        let details: Value = match action {
            "qr_code_create" => json!({"qrValue": format!("QR-{index:03}"), "points": 5}),
            "qr_scan" => json!(format!("{{\"scannedBy\":\"{}\"}}", seed_id(Collection::Users, index + 1))),
            _ => json!({"imageUrl": format!("/uploads/receipts/{index}.jpg"), "totalAmount": 12.5}),
        };
        store
            .insert_document(
                Collection::History,
                json!({
                    "_id": seed_id(Collection::History, index),
                    "user": seed_id(Collection::Users, index + 1),
                    "session": format!("session-{:03}", index),
                    "relatedBusiness": business_user_id(index % 2),
                    "actionType": action,
                    "points": 5 * (index as i64 + 1),
                    "details": details,
                    "timestamp": day(index),
                }),
            )
            .await?;
    }
    Ok(())
}

async fn load_receipts<S: Store>(store: &S) -> Result<()> {
    let cases = ["case_0_25", "case_0_5", "case_0_75", "case_1"];
    let statuses = ["pending", "approved", "rejected"];
    for index in 0..6 {
        store
            .insert_document(
                Collection::Receipts,
                json!({
                    "_id": seed_id(Collection::Receipts, index),
                    "business": business_user_id(index % 2),
                    "type": "receipt",
                    "value": format!("RCPT-{:05}", 8800 + index),
                    "points": 20 + index as i64 * 5,
                    "isActive": true,
                    "status": statuses[index % statuses.len()],
                    "meta": {
                        "category": cases[index % cases.len()],
                        "extractedData": [
                            {"name": "Guinness Draught", "quantity": 4},
                            {"name": "Guinness Foreign Extra", "quantity": 1 + index},
                        ],
                        "totalAmount": 12.5 + index as f64 * 3.0,
                        "caseQuantity": 0.25 * (1 + index % 4) as f64,
                        "imageUrl": format!("/uploads/receipts/{index}.jpg"),
                    },
                    "createdAt": day(index + 3),
                }),
            )
            .await?;
    }
    Ok(())
}
