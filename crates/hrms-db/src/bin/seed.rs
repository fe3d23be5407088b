//! # Seed Data Generator
//!
//! Populates the database with departments, roles and employees for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 50 employees (default)
//! cargo run -p hrms-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p hrms-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p hrms-db --bin seed -- --db ./data/hrms.db
//! ```
//!
//! Each department gets its roles; employees are spread round-robin across
//! departments with a code of the form `EMP-0001`.

use chrono::{Duration, NaiveDate, Utc};
use hrms_core::{Department, Employee, EmployeeStatus, EmployeeType, Money, Role};
use hrms_db::{generate_id, Database, DbConfig};
use std::env;

/// Departments and the roles offered in each.
const DEPARTMENTS: &[(&str, &[&str])] = &[
    ("Engineering", &["Software Engineer", "QA Engineer", "Engineering Lead"]),
    ("Human Resources", &["HR Generalist", "Recruiter"]),
    ("Finance", &["Accountant", "Payroll Specialist"]),
    ("Sales", &["Account Executive", "Sales Manager"]),
    ("Operations", &["Operations Analyst", "Office Administrator"]),
];

const FIRST_NAMES: &[&str] = &[
    "Aarav", "Meera", "Kabir", "Ananya", "Rohan", "Ishita", "Vikram", "Sara", "Dev", "Nisha",
    "Arjun", "Leela", "Omar", "Priya", "Tara",
];

const LAST_NAMES: &[&str] = &[
    "Sharma", "Iyer", "Khan", "Menon", "Das", "Kapoor", "Reddy", "Joshi", "Nair", "Bose",
];

/// Monthly salary bands in minor units.
const SALARY_BANDS: &[i64] = &[3_500_000, 4_800_000, 6_200_000, 8_000_000, 12_000_000];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path = String::from("./hrms_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("HRMS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of employees to generate (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./hrms_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("HRMS Seed Data Generator");
    println!("========================");
    println!("Database:  {}", db_path);
    println!("Employees: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.employees().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} employees", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut slots: Vec<(String, String)> = Vec::new();

    for (name, roles) in DEPARTMENTS {
        let department = Department {
            id: generate_id(),
            name: name.to_string(),
            manager_id: None,
            created_at: now,
            updated_at: now,
        };
        db.departments().insert(&department).await?;

        for role_name in roles.iter() {
            let role = Role {
                id: generate_id(),
                department_id: department.id.clone(),
                name: role_name.to_string(),
                description: None,
                created_at: now,
            };
            db.roles().insert(&role).await?;
            slots.push((department.id.clone(), role.id));
        }
    }
    println!("✓ Created {} departments, {} roles", DEPARTMENTS.len(), slots.len());

    let start = std::time::Instant::now();
    let mut generated = 0;
    for seed in 0..count {
        let (department_id, role_id) = &slots[seed % slots.len()];
        let employee = generate_employee(seed, department_id, role_id);
        if let Err(e) = db.employees().insert(&employee).await {
            eprintln!("Failed to insert {}: {}", employee.employee_code, e);
            continue;
        }
        generated += 1;
    }

    println!("✓ Generated {} employees in {:?}", generated, start.elapsed());
    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Generates one employee with plausible data derived from `seed`.
fn generate_employee(seed: usize, department_id: &str, role_id: &str) -> Employee {
    let now = Utc::now();
    let first_name = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last_name = LAST_NAMES[(seed / FIRST_NAMES.len() + seed) % LAST_NAMES.len()];

    let base_join = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default();
    let join_date = base_join + Duration::days(((seed * 37) % 2500) as i64);

    Employee {
        id: generate_id(),
        employee_code: format!("EMP-{:04}", seed + 1),
        user_id: None,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!(
            "{}.{}{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            seed + 1
        ),
        phone: format!("+91-98{:08}", seed * 7919 % 100_000_000),
        photo_url: None,
        department_id: department_id.to_string(),
        role_id: role_id.to_string(),
        date_of_birth: None,
        address: None,
        join_date,
        // Every tenth employee has left
        status: if seed % 10 == 9 {
            EmployeeStatus::Inactive
        } else {
            EmployeeStatus::Active
        },
        salary_monthly: Money::from_minor(SALARY_BANDS[seed % SALARY_BANDS.len()]),
        bank_account: Some(format!("{:012}", 100_000_000 + seed)),
        ifsc_code: Some("HDFC0001234".to_string()),
        employee_type: if seed % 4 == 3 {
            EmployeeType::Contract
        } else {
            EmployeeType::Permanent
        },
        emergency_contact: None,
        created_by: Some("seed".to_string()),
        created_at: now,
        updated_at: now,
    }
}
