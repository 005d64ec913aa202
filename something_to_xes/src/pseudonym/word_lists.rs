//! Source lists for the finite pseudonym pools

/// First names combined with [`SURNAMES`] to build the `name` pool
pub const FIRST_NAMES: &[&str] = &[
    "Anders", "Anna", "Birgitte", "Bo", "Camilla", "Christian", "Dorthe", "Emil", "Emma",
    "Erik", "Freja", "Frederik", "Gitte", "Hanne", "Hans", "Ida", "Inger", "Jakob", "Jens",
    "Johanne", "Karen", "Kasper", "Kirsten", "Lars", "Laura", "Lene", "Lise", "Magnus",
    "Maja", "Mads", "Marianne", "Mette", "Mikkel", "Morten", "Nanna", "Niels", "Ole",
    "Pernille", "Peter", "Rasmus", "Rikke", "Signe", "Simon", "Sofie", "Susanne", "Søren",
    "Thomas", "Tove", "Ulla", "Viggo",
];

/// Surnames combined with [`FIRST_NAMES`] to build the `name` pool
pub const SURNAMES: &[&str] = &[
    "Andersen", "Bach", "Berg", "Bertelsen", "Brandt", "Christensen", "Dahl", "Eriksen",
    "Frandsen", "Hansen", "Henriksen", "Holm", "Iversen", "Jacobsen", "Jensen", "Jeppesen",
    "Johansen", "Jørgensen", "Kjær", "Knudsen", "Kristensen", "Larsen", "Lauridsen", "Lund",
    "Madsen", "Mikkelsen", "Mortensen", "Møller", "Nielsen", "Nissen", "Olsen", "Pedersen",
    "Petersen", "Poulsen", "Rasmussen", "Schmidt", "Sørensen", "Svendsen", "Thomsen",
    "Vestergaard", "Villadsen", "Winther", "Østergaard", "Ahmed", "Bauer", "Costa", "Dubois",
    "Fischer", "García", "Kowalski",
];

/// Place names making up the `place` pool
pub const PLACES: &[&str] = &[
    "Aabenraa", "Aalborg", "Aarhus", "Allerød", "Assens", "Ballerup", "Billund", "Bogense",
    "Brønderslev", "Dragør", "Ebeltoft", "Esbjerg", "Faaborg", "Fredericia", "Frederikshavn",
    "Frederikssund", "Grenaa", "Greve", "Gribskov", "Haderslev", "Hadsten", "Helsingør",
    "Herning", "Hillerød", "Hjørring", "Holbæk", "Holstebro", "Horsens", "Hvidovre",
    "Ikast", "Kalundborg", "Kerteminde", "Kolding", "Korsør", "Køge", "Lemvig", "Lyngby",
    "Maribo", "Middelfart", "Nakskov", "Næstved", "Nyborg", "Nykøbing", "Odder", "Odense",
    "Randers", "Ribe", "Ringkøbing", "Ringsted", "Roskilde", "Rudkøbing", "Silkeborg",
    "Skagen", "Skanderborg", "Skive", "Slagelse", "Sorø", "Struer", "Svendborg", "Sæby",
    "Thisted", "Tønder", "Vejle", "Viborg", "Vordingborg", "Ærøskøbing", "Bergen", "Bremen",
    "Dresden", "Gdańsk", "Göteborg", "Hamburg", "Helsinki", "Kiel", "Lübeck", "Malmö",
    "Oslo", "Riga", "Rostock", "Stockholm", "Tallinn", "Tampere", "Trondheim", "Turku",
    "Uppsala", "Vilnius", "Visby", "Ystad",
];
