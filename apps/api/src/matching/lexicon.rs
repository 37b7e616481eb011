//! Word lists backing the text normalizer.
//!
//! The tables are plain data so alternate lists can be injected through
//! `Normalizer::with_lexicon` in tests or for other domains.

/// General English stop words (function words, pronouns, auxiliaries).
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "but", "by", "ca", "can", "cannot", "could", "did", "do", "does", "doing",
    "done", "down", "due", "during", "each", "either", "else", "elsewhere", "enough", "etc",
    "even", "ever", "every", "everyone", "everything", "everywhere", "except", "few", "first",
    "for", "former", "formerly", "from", "front", "full", "further", "get", "give", "go", "had",
    "has", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hers",
    "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "indeed", "into",
    "is", "it", "its", "itself", "just", "keep", "last", "latter", "least", "less", "made",
    "make", "many", "may", "me", "meanwhile", "might", "mine", "more", "moreover", "most",
    "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
    "nevertheless", "next", "no", "nobody", "none", "nor", "not", "nothing", "now", "nowhere",
    "of", "off", "often", "on", "once", "only", "onto", "or", "other", "others", "otherwise",
    "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put",
    "quite", "rather", "really", "regarding", "same", "say", "see", "seem", "seemed", "seeming",
    "seems", "serious", "several", "she", "should", "show", "side", "since", "so", "some",
    "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still", "such",
    "take", "than", "that", "the", "their", "them", "themselves", "then", "thence", "there",
    "thereafter", "thereby", "therefore", "therein", "these", "they", "this", "those", "though",
    "through", "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards",
    "under", "unless", "until", "up", "upon", "us", "used", "using", "various", "very", "via",
    "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever", "where",
    "whereas", "whereby", "wherein", "whether", "which", "while", "who", "whoever", "whole",
    "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

/// Hiring, HR and corporate vocabulary that carries no matching signal.
pub const DOMAIN_STOP_WORDS: &[&str] = &[
    // hiring / generic
    "job", "description", "role", "seek", "position", "candidate", "ideal", "opportunity",
    "join", "client", "company", "new", "type", "remote", "experience", "work", "year", "skill",
    "require", "requirement", "include", "need", "strong", "ability", "knowledge",
    "responsible",
    // hr / benefits
    "pay", "benefit", "salary", "range", "employee", "disability", "equal", "time", "base",
    "status",
    // vague verbs
    "provide", "focus", "drive", "collaborate", "support", "build", "help", "create",
    "maintain", "perform",
    // generic tech context
    "solution", "system", "environment", "platform", "product", "service", "technology",
    "technical", "application", "industry", "high", "software", "engineer", "engineering",
    "development", "develop",
    // recruiting / process
    "interview", "recruiter", "prospect", "select", "review", "meet", "touch", "region", "fill",
    "process", "aspect",
    // corporate fluff
    "impact", "fast", "pace", "inspire", "excite", "excited", "successful", "dynamic",
    "demanding", "challenge", "varied", "culture", "passion", "mission", "critical",
    "commercial", "good", "excellent", "solid", "expert", "proficiently", "minimum", "related",
    "specific", "wide", "array", "proven", "track", "record", "deep", "outcome", "real",
    "thinker", "acuman", "acumen", "important", "fundamental",
    // benefits / legal
    "insurance", "medical", "life", "retirement", "tax", "free", "saving", "plan", "healthcare",
    "incentive", "compensation", "eligible", "discretionary", "bonus", "bachelor", "degree",
    "discipline", "stem", "accordance", "applicable", "law", "legal", "compliance",
    "regulatory", "addition", "program", "fund", "funding", "settlement", "investor",
    // generic verbs / nouns
    "look", "know", "prove", "manage", "solve", "participate", "align", "increase", "maximize",
    "iterate", "define", "spec", "change", "flex", "course", "pre", "gen", "desk", "partner",
    "team", "task", "problem", "dissect", "return", "efficiency", "research", "analysis",
    "power", "skills", "talent", "level", "following", "access", "market", "seniority",
    // web / contact residue
    "https", "http", "com", "www", "career", "careers", "apply", "website", "location",
    "locations", "email", "contact", "toast", "toasttab", "restaurant",
];

/// Base forms that are verbs in job-ad prose; their inflections are tagged VERB.
/// Nouns that double as verbs ("design", "lead") are left out so their bare forms stay nouns.
pub const VERB_LEMMAS: &[&str] = &[
    "achieve", "adapt", "analyze", "apply", "assist", "automate", "be", "become", "bring",
    "build", "collaborate", "communicate", "contribute", "coordinate", "create", "deliver",
    "deploy", "develop", "drive", "enable", "enhance", "ensure", "establish", "evaluate",
    "execute", "grow", "handle", "have", "help", "hire", "identify", "implement", "improve",
    "integrate", "join", "learn", "leverage", "look", "love", "maintain", "manage", "need",
    "offer", "operate", "optimize", "own", "prefer", "provide", "reduce", "require", "run",
    "seek", "serve", "ship", "solve", "take", "thrive", "troubleshoot", "understand", "use",
    "want", "write",
];

/// Adjectives and adverbs common in postings that suffix rules miss.
pub const MODIFIER_WORDS: &[&str] = &[
    "able", "agile", "available", "best", "better", "big", "clear", "close", "competitive",
    "complex", "current", "daily", "diverse", "early", "easy", "entire", "extensive", "flexible",
    "global", "great", "hands", "hybrid", "independent", "inclusive", "junior", "key", "large",
    "latest", "main", "major", "modern", "multiple", "open", "paid", "preferred", "principal",
    "proactive", "quick", "ready", "relevant", "robust", "scalable", "senior", "similar",
    "small", "smart", "unique", "unlimited", "willing",
];

/// Number words treated like numerals.
pub const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "twenty", "thirty", "forty", "fifty", "hundred", "thousand", "million",
    "billion",
];

/// Nouns that already are their own lemma despite a plural-looking ending.
pub const INVARIANT_NOUNS: &[&str] = &[
    "analytics", "aws", "business", "economics", "express", "graphics", "ios", "jenkins",
    "kubernetes", "logistics", "macos", "mathematics", "news", "ops", "devops", "mlops",
    "physics", "postgres", "redis", "robotics", "sales", "series", "species", "statistics",
    "status", "windows",
];

/// Irregular plural → singular pairs.
pub const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("children", "child"),
    ("criteria", "criterion"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("people", "person"),
    ("phenomena", "phenomenon"),
    ("women", "woman"),
];
