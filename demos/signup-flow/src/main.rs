//! Walks every session flow end to end against the in-memory directory:
//! cold start, a failed and a successful sign-in, sign-out, client
//! sign-up with form validation, and a therapist application. After each
//! step it prints where the navigation gate would send the user.
//!
//! Run with `RUST_LOG=debug` to watch the state transitions underneath.

use std::sync::Arc;

use careline::prelude::*;
use careline::{TherapistApplication, TherapyType, validate};
use chrono::Utc;

#[tokio::main]
async fn main() -> Result<(), CarelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // The backend stand-ins, with one account already on file.
    let directory = Arc::new(MemoryDirectory::new());
    directory.seed_account(
        "avery@example.com",
        "secret-pw",
        "Avery Quinn",
        Role::Client,
    );
    let store = Arc::new(MemoryApplicationStore::new());

    let session =
        SessionManager::new(Arc::clone(&directory), Arc::clone(&store));

    // -- Cold start -------------------------------------------------------
    print_route("cold start", &session);
    directory.resolve_ambient();
    settled(&session).await;
    print_route("ambient session resolved", &session);

    // -- Sign-in: wrong password first, then the real one -----------------
    match session.sign_in("avery@example.com", "nope").await {
        Err(err) => println!("sign-in rejected as expected: {err}"),
        Ok(()) => unreachable!("wrong password must not sign in"),
    }
    session.sign_in("avery@example.com", "secret-pw").await?;
    print_route("signed in", &session);

    session.sign_out().await?;
    print_route("signed out", &session);

    // -- Client sign-up, validated the way the screen does it --------------
    let profile = SignUpProfile {
        first_name: "Sam".into(),
        last_name: "Lee".into(),
        email: "sam@example.com".into(),
        phone: "555-0102".into(),
        birthdate: "03/09/1988".into(),
        role: Role::Unknown,
    };
    validate::validate_sign_up(&profile, Utc::now().date_naive())?;
    session.create_client_account(profile, "another-pw").await?;
    print_route("client account created", &session);
    session.sign_out().await?;

    // -- Therapist application --------------------------------------------
    let application = TherapistApplication {
        first_name: "Noor".into(),
        last_name: "Haddad".into(),
        email: "noor@example.com".into(),
        phone: "555-0103".into(),
        address: "4 Cedar Way".into(),
        therapy_type: TherapyType::MentalHealth,
        state: "WA".into(),
        cert_number: "C-2210".into(),
        cert_date: "05/20/2018".into(),
        cert_expiration: "05/20/2028".into(),
        insurance_expiration: "01/01/2027".into(),
        cert_files: vec!["cert_1.pdf".into()],
        insurance_files: vec!["insurance_1.pdf".into()],
    };
    validate::validate_therapist_application(&application)?;
    let application_id = session
        .create_therapist_application(application, "therapist-pw")
        .await?;
    print_route("therapist application submitted", &session);

    let record = store.find(application_id).expect("record was stored");
    println!(
        "application {application_id} for {} is {} (submitted {})",
        record.applicant, record.status, record.submitted_at
    );

    Ok(())
}

async fn settled(
    session: &SessionManager<MemoryDirectory, MemoryApplicationStore>,
) {
    let mut rx = session.subscribe();
    rx.wait_for(|snapshot| !snapshot.loading)
        .await
        .expect("session manager alive");
}

fn print_route(
    step: &str,
    session: &SessionManager<MemoryDirectory, MemoryApplicationStore>,
) {
    let snapshot = session.snapshot();
    println!("[{step}] route = {:?}", route_for(&snapshot));
}
