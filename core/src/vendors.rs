use std::sync::OnceLock;

use mac_oui::Oui;
use pnet::util::MacAddr;
use tracing::warn;

use presence_common::vendors::VendorRepository;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

/// Loads the bundled OUI database on first use. A load failure disables
/// vendor enrichment instead of aborting.
fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!(error = %e, "failed to load OUI database, vendor lookup disabled");
                None
            }
        })
        .as_ref()
}

pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, mac: MacAddr) -> Option<String> {
        let db = get_oui_db()?;
        match db.lookup_by_mac(&mac.to_string()) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            _ => None,
        }
    }
}
