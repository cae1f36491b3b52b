//! 随机用户生成（bulk_create_random）
//!
//! 名字从固定名/姓表中抽取，email 为「小写名字去空格 + 三位数字 @ 域名」；
//! 与现有记录及同批次冲突时重抽，多次冲突后用 id 消歧。

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Hank",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
];
const DOMAINS: &[&str] = &["example.com", "test.org", "demo.net", "mail.io"];

/// 重抽次数上限，超过后改用 id 消歧
const MAX_DRAWS: usize = 16;

pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("User");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Random");
    format!("{} {}", first, last)
}

fn local_part(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

pub fn random_email<R: Rng + ?Sized>(rng: &mut R, name: &str) -> String {
    let domain = DOMAINS.choose(rng).copied().unwrap_or("example.com");
    format!("{}{}@{}", local_part(name), rng.gen_range(100..=999), domain)
}

/// 生成一组 (name, email)，email 不与 taken（小写）中任何一项重复；生成后写入 taken
pub fn synthesize_identity<R: Rng + ?Sized>(
    rng: &mut R,
    taken: &mut HashSet<String>,
    id: u64,
) -> (String, String) {
    let name = random_name(rng);
    for _ in 0..MAX_DRAWS {
        let email = random_email(rng, &name);
        if taken.insert(email.to_lowercase()) {
            return (name, email);
        }
    }

    let domain = DOMAINS.choose(rng).copied().unwrap_or("example.com");
    let base = format!("{}{}", local_part(&name), id);
    let mut email = format!("{}@{}", base, domain);
    let mut n = 1;
    while !taken.insert(email.to_lowercase()) {
        email = format!("{}.{}@{}", base, n, domain);
        n += 1;
    }
    (name, email)
}
