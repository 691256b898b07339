//! Database seeder for Lendshop development and testing.
//!
//! Seeds two sample clients (one DNI, one RUC), each with an active loan whose
//! first installments are already past due, so the overdue list and late fees
//! have something to show.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, Utc};
use lendshop_core::client::{ClientDraft, DocumentType};
use lendshop_core::schedule::{Frequency, LoanLimits};
use lendshop_db::repositories::{ClientRepository, CreateLoanInput, LoanRepository};
use lendshop_shared::LendingConfig;
use rust_decimal::Decimal;

struct SampleClient {
    document_type: DocumentType,
    document_number: &'static str,
    full_name: &'static str,
    address: &'static str,
    phone: &'static str,
    email: Option<&'static str>,
    principal: Decimal,
    interest_percent: Decimal,
    installments: u32,
    frequency: Frequency,
    days_ago: i64,
}

fn samples() -> Vec<SampleClient> {
    vec![
        SampleClient {
            document_type: DocumentType::Dni,
            document_number: "45678912",
            full_name: "Rosa Quispe Mamani",
            address: "Jr. Los Olivos 245, Lima",
            phone: "987654321",
            email: Some("rosa.quispe@correo.pe"),
            principal: Decimal::new(1_000, 0),
            interest_percent: Decimal::new(10, 0),
            installments: 10,
            frequency: Frequency::Weekly,
            days_ago: 30,
        },
        SampleClient {
            document_type: DocumentType::Ruc,
            document_number: "20512345678",
            full_name: "Inversiones Andinas SAC",
            address: "Av. Arequipa 1500, Lince",
            phone: "014445566",
            email: None,
            principal: Decimal::new(5_000, 0),
            interest_percent: Decimal::new(12, 0),
            installments: 6,
            frequency: Frequency::Monthly,
            days_ago: 65,
        },
    ]
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = lendshop_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let clients = ClientRepository::new(db.clone());
    let loans = LoanRepository::new(db);
    let limits = LoanLimits::from(&LendingConfig::default());
    let today = Utc::now().date_naive();

    for sample in samples() {
        println!("Seeding client {}...", sample.document_number);
        seed_client(&clients, &loans, &limits, sample, today).await;
    }

    println!("Seeding complete!");
}

async fn seed_client(
    clients: &ClientRepository,
    loans: &LoanRepository,
    limits: &LoanLimits,
    sample: SampleClient,
    today: chrono::NaiveDate,
) {
    let existing = clients
        .find_by_document(sample.document_number)
        .await
        .expect("Failed to query clients");
    if existing.is_some() {
        println!("  Client already exists, skipping...");
        return;
    }

    let client = match clients
        .create(ClientDraft {
            document_type: sample.document_type,
            document_number: sample.document_number.to_string(),
            full_name: sample.full_name.to_string(),
            address: sample.address.to_string(),
            phone: sample.phone.to_string(),
            email: sample.email.map(str::to_string),
        })
        .await
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("  Failed to insert client: {e}");
            return;
        }
    };
    println!("  Created client: {}", client.full_name);

    let input = CreateLoanInput {
        client_id: client.id,
        principal: sample.principal,
        interest_percent: sample.interest_percent,
        installments: sample.installments,
        frequency: sample.frequency,
        start_date: today - Duration::days(sample.days_ago),
    };
    match loans.create(input, limits).await {
        Ok(loan) => println!(
            "  Created loan {} for {} in {} installments",
            loan.loan.id,
            loan.loan.total_amount,
            loan.installments.len()
        ),
        Err(e) => eprintln!("  Failed to create loan: {e}"),
    }
}
