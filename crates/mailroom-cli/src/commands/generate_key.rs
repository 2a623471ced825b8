use clap::Args;
use mailroom_core::SecretsVault;

#[derive(Args)]
pub struct GenerateKeyCommand {}

impl GenerateKeyCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let key = SecretsVault::generate_key();
        println!("{key}");
        println!();
        println!("Set this as MAILROOM_ENCRYPTION_KEY (or pass --encryption-key to `mailroom serve`).");
        println!("Store it safely; settings encrypted with it cannot be recovered without it.");
        Ok(())
    }
}
