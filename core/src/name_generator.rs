//! Deterministic person names from curated lists.

use crate::rng::SeedRng;

pub struct NameGenerator;

impl NameGenerator {
    pub fn full_name(rng: &mut SeedRng) -> String {
        format!("{} {}", rng.pick(FIRST_NAMES), rng.pick(LAST_NAMES))
    }

    /// The same person written differently on a later FIR: initial only,
    /// upper-cased, or with a father's-name suffix.
    pub fn variant_of(name: &str, rng: &mut SeedRng) -> String {
        let mut parts = name.split_whitespace();
        let first = parts.next().unwrap_or_default();
        let last = parts.next().unwrap_or_default();
        match rng.next_u64_below(3) {
            0 => format!("{}. {last}", first.chars().next().unwrap_or('X')),
            1 => name.to_uppercase(),
            _ => format!("{name} s/o {}", rng.pick(FIRST_NAMES)),
        }
    }

    pub fn relation(rng: &mut SeedRng) -> &'static str {
        *rng.pick(RELATIONS)
    }
}

const FIRST_NAMES: &[&str] = &[
    "Aarav", "Vivaan", "Aditya", "Arjun", "Sai", "Rohan", "Karan", "Vikram", "Rahul", "Amit",
    "Suresh", "Ramesh", "Mahesh", "Dinesh", "Rajesh", "Manoj", "Sunil", "Anil", "Pankaj", "Deepak",
    "Imran", "Salman", "Farhan", "Iqbal", "Harpreet", "Gurpreet", "Jaswinder", "Manpreet",
    "Priya", "Anjali", "Pooja", "Neha", "Kavita", "Sunita", "Rekha", "Meena", "Shabana", "Ritu",
];

const LAST_NAMES: &[&str] = &[
    "Kumar", "Singh", "Sharma", "Verma", "Yadav", "Gupta", "Mishra", "Pandey", "Tiwari", "Chauhan",
    "Khan", "Ansari", "Qureshi", "Gill", "Sandhu", "Patel", "Shah", "Reddy", "Nair", "Das",
];

const RELATIONS: &[&str] = &["Father", "Mother", "Brother", "Uncle", "Wife", "Friend", "Employer"];
