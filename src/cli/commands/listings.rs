//! Listing, lead, and profile commands.

use console::style;

use super::helpers::truncate;
use crate::config::Settings;
use crate::models::{Lead, ListingStatus, Profile};
use crate::repository::{LeadRepository, ListingFilter, ListingRepository};

/// List listings with optional filters.
pub fn cmd_listings(
    settings: &Settings,
    status: Option<&str>,
    category: Option<String>,
    limit: u32,
) -> anyhow::Result<()> {
    let status = match status {
        Some(s) => match ListingStatus::parse(s) {
            Some(status) => Some(status),
            None => {
                println!(
                    "{} Unknown status '{}' (draft, active, sold, removed)",
                    style("✗").red(),
                    s
                );
                return Ok(());
            }
        },
        None => None,
    };

    let repo = ListingRepository::new(&settings.database_path())?;
    let filter = ListingFilter {
        status,
        category,
        limit: Some(limit),
        ..Default::default()
    };
    let listings = repo.list(&filter)?;

    if listings.is_empty() {
        println!("{} No listings", style("!").yellow());
        return Ok(());
    }

    println!("{}", "-".repeat(90));
    println!(
        "{:<36} {:<32} {:<10} {:<8} Price",
        "ID", "Title", "Status", "Cat"
    );
    println!("{}", "-".repeat(90));
    for l in &listings {
        let price = l
            .price_cents
            .map(|c| format!("${:.2}", c as f64 / 100.0))
            .unwrap_or_else(|| "call".to_string());
        println!(
            "{:<36} {:<32} {:<10} {:<8} {}",
            l.id,
            truncate(&l.title, 31),
            l.status.as_str(),
            truncate(l.category.as_deref().unwrap_or(""), 7),
            price,
        );
    }
    println!("{} listings", listings.len());
    Ok(())
}

/// List captured leads, optionally for one profile.
pub fn cmd_leads(settings: &Settings, profile: Option<&str>) -> anyhow::Result<()> {
    let repo = LeadRepository::new(&settings.database_path())?;
    let leads = match profile {
        Some(profile_id) => repo.recent_for_profile(profile_id, 50)?,
        None => repo.list_all()?,
    };

    if leads.is_empty() {
        println!("{} No leads", style("!").yellow());
        return Ok(());
    }

    for lead in &leads {
        println!(
            "{} {} <{}> [{}] {}",
            lead.created_at.format("%Y-%m-%d"),
            lead.name,
            lead.phone,
            lead.status.as_str(),
            truncate(&lead.message, 60),
        );
    }
    Ok(())
}

/// Capture a lead, routing it to the listing's dealer when a listing
/// is given.
pub fn cmd_lead_add(
    settings: &Settings,
    name: String,
    phone: String,
    message: String,
    email: Option<String>,
    listing_id: Option<&str>,
    source: String,
) -> anyhow::Result<()> {
    let db = settings.database_path();
    let leads = LeadRepository::new(&db)?;

    let mut lead = Lead::new(name, phone, message, source);
    lead.email = email;
    if let Some(listing_id) = listing_id {
        let listings = ListingRepository::new(&db)?;
        match listings.get(listing_id)? {
            Some(listing) => {
                lead.listing_id = Some(listing.id);
                lead.profile_id = Some(listing.profile_id);
            }
            None => {
                println!("{} Listing '{}' not found", style("✗").red(), listing_id);
                return Ok(());
            }
        }
    }

    leads.insert(&lead)?;
    println!("{} Captured lead {}", style("✓").green(), lead.id);
    Ok(())
}

/// List dealer profiles.
pub fn cmd_profile_list(settings: &Settings) -> anyhow::Result<()> {
    let repo = ListingRepository::new(&settings.database_path())?;
    let profiles = repo.list_profiles()?;

    if profiles.is_empty() {
        println!(
            "{} No profiles. Add one with 'axles profile add'",
            style("!").yellow()
        );
        return Ok(());
    }

    for p in &profiles {
        println!(
            "{:<36} {:<25} {}",
            p.id,
            truncate(&p.company_name, 24),
            p.city.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Add a dealer profile.
pub fn cmd_profile_add(
    settings: &Settings,
    company_name: String,
    phone: Option<String>,
    email: Option<String>,
    city: Option<String>,
    state: Option<String>,
) -> anyhow::Result<()> {
    let repo = ListingRepository::new(&settings.database_path())?;
    let mut profile = Profile::new(company_name);
    profile.phone = phone;
    profile.email = email;
    profile.city = city;
    profile.state = state;
    repo.save_profile(&profile)?;
    println!(
        "{} Added profile {} ({})",
        style("✓").green(),
        profile.company_name,
        profile.id
    );
    Ok(())
}
