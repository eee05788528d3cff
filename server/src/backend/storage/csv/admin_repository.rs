use anyhow::Result;
use async_trait::async_trait;
use csv::{Reader, Writer};
use log::info;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use crate::backend::domain::models::admin::AdminCredential;
use crate::backend::storage::traits::AdminStorage;

/// Default account seeded the first time the credentials table is created.
const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "1234";

/// CSV-based administrator credentials repository
///
/// Columns: `username,password`. The table is seeded with the default
/// account when missing so a fresh install can always log in.
#[derive(Clone)]
pub struct AdminRepository {
    connection: CsvConnection,
}

impl AdminRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn write_credentials(&self, credentials: &[AdminCredential]) -> Result<()> {
        let file_path = self.connection.admin_file_path();
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let writer = BufWriter::new(file);
            let mut csv_writer = Writer::from_writer(writer);

            csv_writer.write_record(["username", "password"])?;
            for credential in credentials {
                csv_writer.write_record(&[&credential.username, &credential.password])?;
            }
            csv_writer.flush()?;
        }

        std::fs::rename(&temp_path, &file_path)?;
        Ok(())
    }
}

#[async_trait]
impl AdminStorage for AdminRepository {
    async fn load_credentials(&self) -> Result<Vec<AdminCredential>> {
        let file_path = self.connection.admin_file_path();
        if !file_path.exists() {
            info!("Seeding default administrator account");
            let seeded = vec![AdminCredential {
                username: DEFAULT_USERNAME.to_string(),
                password: DEFAULT_PASSWORD.to_string(),
            }];
            self.write_credentials(&seeded)?;
            return Ok(seeded);
        }

        let file = File::open(&file_path)?;
        let reader = BufReader::new(file);
        let mut csv_reader = Reader::from_reader(reader);

        let mut credentials = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            credentials.push(AdminCredential {
                username: record.get(0).unwrap_or("").to_string(),
                password: record.get(1).unwrap_or("").to_string(),
            });
        }

        Ok(credentials)
    }

    async fn store_credentials(&self, credentials: &[AdminCredential]) -> Result<()> {
        self.write_credentials(credentials)
    }
}
