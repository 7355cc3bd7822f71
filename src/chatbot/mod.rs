//! Deterministic legal information assistant. Answers are looked up from
//! a fixed knowledge base of statute sections, FAQs and keyword topics;
//! the same question always gets the same reply.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)section\s+(\d+[A-Za-z]?)").expect("valid section regex"));

static CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ipc|crpc|cpc|it act|companies act|indian constitution")
        .expect("valid code regex")
});

/// Statute sections keyed by (code, section number).
static LEGAL_SECTIONS: Lazy<HashMap<(&'static str, &'static str), &'static str>> =
    Lazy::new(|| {
        HashMap::from([
            (
                ("ipc", "302"),
                "Section 302 of IPC deals with punishment for murder. If convicted, the punishment is death or imprisonment for life and fine.",
            ),
            (
                ("ipc", "376"),
                "Section 376 of IPC deals with punishment for rape. It includes imprisonment not less than 7 years which may extend to life and fine.",
            ),
            (
                ("ipc", "420"),
                "Section 420 of IPC deals with cheating and dishonestly inducing delivery of property. The punishment is imprisonment up to 7 years and fine.",
            ),
            (
                ("ipc", "124a"),
                "Section 124A of IPC deals with sedition. The punishment is imprisonment for life with fine, or imprisonment up to 3 years with fine.",
            ),
            (
                ("ipc", "304b"),
                "Section 304B of IPC deals with dowry death. The minimum punishment is 7 years imprisonment which may extend to life imprisonment.",
            ),
            (
                ("ipc", "498a"),
                "Section 498A of IPC deals with husband or relative of husband subjecting a woman to cruelty. Punishment is imprisonment up to 3 years and fine.",
            ),
            (
                ("crpc", "41"),
                "Section 41 of CrPC deals with when police may arrest without warrant.",
            ),
            (
                ("crpc", "125"),
                "Section 125 of CrPC deals with order for maintenance of wives, children and parents.",
            ),
            (
                ("crpc", "144"),
                "Section 144 of CrPC deals with power to issue order in urgent cases of nuisance or apprehended danger.",
            ),
            (
                ("crpc", "161"),
                "Section 161 of CrPC deals with examination of witnesses by police.",
            ),
            (
                ("cpc", "9"),
                "Section 9 of CPC deals with courts to try all civil suits unless barred.",
            ),
            (
                ("cpc", "11"),
                "Section 11 of CPC deals with res judicata, meaning no court shall try any suit in which the matter has been directly and substantially in issue in a former suit.",
            ),
        ])
    });

/// FAQ answers keyed by the phrase that must appear in the question.
static LEGAL_FAQS: &[(&str, &str)] = &[
    (
        "rights when arrested",
        "When arrested in India, you have the right to: 1) Know the grounds of arrest, 2) Inform a friend/relative, 3) Meet an advocate of your choice, 4) Be produced before a magistrate within 24 hours, 5) Medical examination, and 6) Not be subjected to unnecessary restraint or torture.",
    ),
    (
        "file for divorce",
        "To file for divorce in India, you need to: 1) Have grounds for divorce (cruelty, desertion, etc.), 2) File a petition in the family court, 3) Attempt reconciliation if ordered by court, 4) Go through trial if contested, 5) Wait for the court's decree. The process varies based on personal laws (Hindu, Muslim, Christian, etc.).",
    ),
    (
        "property registration",
        "For property registration in India: 1) Execute a sale deed, 2) Pay appropriate stamp duty, 3) Get the deed registered at the Sub-Registrar's office within 4 months, 4) Pay registration fee, 5) Get the property mutation done in municipal records for tax purposes.",
    ),
    (
        "legally binding will",
        "For a legally binding will in India: 1) It must be in writing, 2) Signed by the testator, 3) Attested by two witnesses, 4) Registration is recommended but not mandatory, 5) The testator must be of sound mind and not coerced.",
    ),
    (
        "starting a business",
        "Legal steps for starting a business in India: 1) Choose a business structure (Proprietorship/Partnership/LLP/Company), 2) Register the business name, 3) Get necessary licenses (GST, Professional Tax, Shop Act), 4) Register under Companies Act if incorporating, 5) Comply with labor laws if hiring employees.",
    ),
];

const DEFAULT_REPLY: &str = "I can provide general legal information on Indian laws including IPC, CrPC, family law, property law, etc. For specific legal advice tailored to your situation, please consult with a qualified advocate who can provide personalized guidance.";

fn extract_section(query: &str) -> Option<String> {
    SECTION_RE
        .captures(query)
        .map(|c| c[1].to_lowercase())
}

fn extract_code(query: &str) -> Option<String> {
    CODE_RE.find(query).map(|m| m.as_str().to_lowercase())
}

/// Longest matching FAQ phrase wins when several appear in the question.
fn find_faq(query: &str) -> Option<&'static str> {
    LEGAL_FAQS
        .iter()
        .filter(|(phrase, _)| query.contains(phrase))
        .max_by_key(|(phrase, _)| phrase.len())
        .map(|(_, answer)| *answer)
}

fn section_info(code: &str, section: &str) -> String {
    match LEGAL_SECTIONS.get(&(code, section)) {
        Some(answer) => (*answer).to_string(),
        None => format!(
            "I don't have specific information about Section {} of {}. For accurate information, please consult a legal professional or refer to the official legal texts.",
            section,
            code.to_uppercase()
        ),
    }
}

/// Produces a reply for one user message.
pub fn reply(message: &str) -> String {
    let query = message.to_lowercase();

    if query.contains("section") {
        let code = extract_code(&query);
        let section = extract_section(&query);
        if code.is_some() || section.is_some() {
            let code = code.unwrap_or_default();
            let section = section.unwrap_or_default();
            return section_info(&code, &section);
        }
    }

    if let Some(answer) = find_faq(&query) {
        return answer.to_string();
    }

    if query.contains("bail") {
        return "Bail is the conditional release of an accused with an assurance to appear in court when required. Regular bail is sought under Section 437 and 439 CrPC. Anticipatory bail, under Section 438 CrPC, is sought before arrest. The application needs to be filed with proper grounds in the appropriate court.".to_string();
    }

    if query.contains("fir") || query.contains("police complaint") {
        return "To file an FIR (First Information Report): 1) Go to the police station with jurisdiction, 2) Provide all details of the incident, 3) Get a copy of the FIR with a unique number, 4) If police refuse to register, approach the Superintendent of Police or file a complaint before the Magistrate under Section 156(3) CrPC.".to_string();
    }

    if query.contains("tenant") || query.contains("landlord") || query.contains("rent") {
        return "Landlord-tenant laws in India vary by state. Generally, a rental agreement should specify rent, duration, security deposit, and maintenance responsibilities. Eviction requires proper notice as per the agreement and state laws. Security deposits must be returned after deducting legitimate costs.".to_string();
    }

    DEFAULT_REPLY.to_string()
}

/// Starter questions shown to users opening the chat.
pub fn suggested_questions() -> Vec<&'static str> {
    vec![
        "What are my rights if I'm arrested?",
        "How do I file for divorce in India?",
        "What is the process for property registration?",
        "How can I draft a legally binding will?",
        "What does Section 420 of IPC deal with?",
    ]
}
