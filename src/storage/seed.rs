use crate::auth::password::hash_password;

use super::models::*;
use super::{Storage, StorageError, StorageResult};

const PRACTICE_AREAS: &[&str] = &[
    "Criminal Law",
    "Family Law",
    "Constitutional Law",
    "Corporate Law",
    "Property Law",
    "Civil Law",
    "Tax Law",
    "Intellectual Property",
    "Divorce",
    "Child Custody",
    "Human Rights",
    "Public Interest",
    "Mergers & Acquisitions",
    "Startups",
    "Technology",
    "Civil Disputes",
    "Contracts",
];

const LOCATIONS: &[(&str, &str, &str)] = &[
    ("New Delhi", "Delhi", "110001"),
    ("South Delhi", "Delhi", "110025"),
    ("East Delhi", "Delhi", "110091"),
    ("West Delhi", "Delhi", "110063"),
    ("North Delhi", "Delhi", "110007"),
    ("Patna", "Bihar", "800001"),
    ("Gaya", "Bihar", "823001"),
    ("Muzaffarpur", "Bihar", "842001"),
    ("Bhagalpur", "Bihar", "812001"),
    ("Darbhanga", "Bihar", "846004"),
    ("Purnia", "Bihar", "854301"),
    ("Arrah", "Bihar", "802301"),
    ("Katihar", "Bihar", "854105"),
    ("Chapra", "Bihar", "841301"),
    ("Ranchi", "Jharkhand", "834001"),
    ("Jamshedpur", "Jharkhand", "831001"),
    ("Dhanbad", "Jharkhand", "826001"),
    ("Bokaro", "Jharkhand", "827001"),
    ("Deoghar", "Jharkhand", "814112"),
    ("Hazaribagh", "Jharkhand", "825301"),
    ("Giridih", "Jharkhand", "815301"),
    ("Mumbai", "Maharashtra", "400001"),
    ("Bangalore", "Karnataka", "560001"),
    ("Chennai", "Tamil Nadu", "600001"),
    ("Kolkata", "West Bengal", "700001"),
    ("Hyderabad", "Telangana", "500001"),
];

struct SeedAdvocate {
    username: &'static str,
    email: &'static str,
    full_name: &'static str,
    phone: &'static str,
    /// 1-based index into LOCATIONS.
    location: usize,
    bio: &'static str,
    experience: u32,
    bar_council_number: &'static str,
    /// 1-based indices into PRACTICE_AREAS.
    specialties: &'static [usize],
}

const ADVOCATES: &[SeedAdvocate] = &[
    SeedAdvocate {
        username: "adv1",
        email: "advocate1@example.com",
        full_name: "Advocate 1",
        phone: "9876543210",
        location: 1,
        bio: "Over 15 years of experience in criminal defense and corporate legal matters. Former additional solicitor at Delhi High Court.",
        experience: 15,
        bar_council_number: "DL/123/2005",
        specialties: &[1, 3, 4],
    },
    SeedAdvocate {
        username: "adv2",
        email: "advocate2@example.com",
        full_name: "Advocate 2",
        phone: "8765432109",
        location: 2,
        bio: "Specializing in family law matters with compassionate representation. Expert in divorce, child custody, and domestic relations.",
        experience: 12,
        bar_council_number: "MH/456/2010",
        specialties: &[2, 9, 10],
    },
    SeedAdvocate {
        username: "adv3",
        email: "advocate3@example.com",
        full_name: "Advocate 3",
        phone: "7654321098",
        location: 3,
        bio: "Tech law specialist with expertise in intellectual property, startups, and technology regulations. Former legal counsel at major tech firms.",
        experience: 9,
        bar_council_number: "KA/789/2013",
        specialties: &[8, 14, 15],
    },
    SeedAdvocate {
        username: "adv4",
        email: "advocate4@example.com",
        full_name: "Advocate 4",
        phone: "6543210987",
        location: 5,
        bio: "Experienced in property law and civil disputes. Specializes in property documentation, tenant disputes, and inheritance cases.",
        experience: 11,
        bar_council_number: "WB/234/2012",
        specialties: &[5, 16, 17],
    },
    SeedAdvocate {
        username: "advocate5",
        email: "advocate5@example.com",
        full_name: "Advocate 5",
        phone: "5432109876",
        location: 4,
        bio: "Corporate law expert with extensive experience in mergers, acquisitions, and business restructuring. Former partner at a top law firm.",
        experience: 18,
        bar_council_number: "TN/567/2004",
        specialties: &[4, 7, 13],
    },
    SeedAdvocate {
        username: "advocate6",
        email: "advocate6@example.com",
        full_name: "Advocate 6",
        phone: "4321098765",
        location: 6,
        bio: "Passionate human rights advocate with expertise in constitutional law and public interest litigation. Worked with several NGOs.",
        experience: 10,
        bar_council_number: "TS/890/2013",
        specialties: &[11, 3, 12],
    },
    SeedAdvocate {
        username: "advocate7",
        email: "advocate7@example.com",
        full_name: "Advocate 7",
        phone: "9876543211",
        location: 7,
        bio: "Expert in criminal law with over 12 years of experience handling high-profile cases in Patna High Court. Specializes in criminal defense and appeals.",
        experience: 12,
        bar_council_number: "BR/234/2011",
        specialties: &[1, 3, 11],
    },
    SeedAdvocate {
        username: "advocate8",
        email: "advocate8@example.com",
        full_name: "Advocate 8",
        phone: "8765432110",
        location: 8,
        bio: "Tribal rights and environmental law expert with extensive experience in Jharkhand. Specializes in land rights cases and environmental litigation.",
        experience: 14,
        bar_council_number: "JH/456/2010",
        specialties: &[5, 11, 12],
    },
    SeedAdvocate {
        username: "advocate9",
        email: "advocate9@example.com",
        full_name: "Advocate 9",
        phone: "7654321109",
        location: 9,
        bio: "Family law advocate with deep understanding of matrimonial matters. Offers compassionate guidance in divorce, maintenance, and child custody cases.",
        experience: 8,
        bar_council_number: "BR/567/2015",
        specialties: &[2, 9, 10],
    },
    SeedAdvocate {
        username: "advocate10",
        email: "advocate10@example.com",
        full_name: "Advocate 10",
        phone: "6543210986",
        location: 11,
        bio: "Corporate and business law expert with experience in industrial disputes. Specializes in labor law and corporate contracts for industrial clients.",
        experience: 9,
        bar_council_number: "JH/789/2014",
        specialties: &[4, 6, 17],
    },
    SeedAdvocate {
        username: "advocate11",
        email: "advocate11@example.com",
        full_name: "Advocate 11",
        phone: "8765432111",
        location: 10,
        bio: "Criminal defense lawyer with expertise in bail applications and trial advocacy. Handles criminal cases at all levels of courts in Bihar.",
        experience: 16,
        bar_council_number: "BR/123/2008",
        specialties: &[1, 3, 6],
    },
    SeedAdvocate {
        username: "advocate12",
        email: "advocate12@example.com",
        full_name: "Advocate 12",
        phone: "7654321108",
        location: 12,
        bio: "Mining and environmental law expert with experience in workers' compensation cases. Specializes in mining regulations and labor rights.",
        experience: 11,
        bar_council_number: "JH/345/2012",
        specialties: &[11, 6, 17],
    },
];

/// Loads the demo dataset: practice areas, Indian locations, and verified
/// advocate profiles, all sharing the password `password123`. Skipped
/// entirely when the backend already holds users, so restarts against a
/// persistent store never duplicate data.
pub async fn populate(storage: &dyn Storage) -> StorageResult<()> {
    if storage.user_count().await? > 0 {
        tracing::debug!("storage already populated, skipping demo seed");
        return Ok(());
    }
    tracing::info!("seeding demo data");

    let mut areas = Vec::with_capacity(PRACTICE_AREAS.len());
    for name in PRACTICE_AREAS {
        areas.push(storage.create_practice_area(name).await?);
    }

    let mut locations = Vec::with_capacity(LOCATIONS.len());
    for (city, state, pincode) in LOCATIONS {
        locations.push(
            storage
                .create_location(NewLocation {
                    city: (*city).to_string(),
                    state: (*state).to_string(),
                    pincode: Some((*pincode).to_string()),
                })
                .await?,
        );
    }

    // All demo accounts share one password, so hash once.
    let password = hash_password("password123")
        .map_err(|e| StorageError::Backend(anyhow::anyhow!("seed password hash: {}", e)))?;

    for seed in ADVOCATES {
        let user = storage
            .create_user(NewUser {
                username: seed.username.to_string(),
                password: password.clone(),
                email: seed.email.to_string(),
                full_name: seed.full_name.to_string(),
                phone: Some(seed.phone.to_string()),
                role: Role::Advocate,
            })
            .await?;

        let advocate = storage
            .create_advocate(NewAdvocate {
                user_id: user.id,
                location_id: locations[seed.location - 1].id.clone(),
                bio: seed.bio.to_string(),
                experience: seed.experience,
                bar_council_number: seed.bar_council_number.to_string(),
                image_url: Some("/assets/advocate-placeholder.svg".to_string()),
                verified: true,
            })
            .await?;

        for index in seed.specialties {
            storage
                .add_specialty(&advocate.id, &areas[index - 1].id)
                .await?;
        }
    }

    for i in 1..=3u32 {
        storage
            .create_user(NewUser {
                username: format!("client{}", i),
                password: password.clone(),
                email: format!("client{}@example.com", i),
                full_name: format!("Demo Client {}", i),
                phone: Some(format!("900000000{}", i)),
                role: Role::Client,
            })
            .await?;
    }

    Ok(())
}
