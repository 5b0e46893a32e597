use crate::codec::decode;
use crate::models::DrawRecord;

/// Jeu de démarrage embarqué (valeurs d'exemple), utilisé quand ni le fichier statique ni la base
/// ne fournissent de tirage. Remplacé dès la première synchronisation réussie.
const SEED_CSV: &str = "\
id,date,f1,f2,f3,f4,f5,b1,b2
24012,2024-01-29,4,11,19,27,33,2,9
24011,2024-01-27,1,8,17,24,30,5,11
24010,2024-01-24,6,13,15,26,35,3,7
24009,2024-01-22,2,9,20,28,31,1,12
24008,2024-01-20,7,12,18,23,34,4,10
24007,2024-01-17,3,10,16,25,29,6,8
24006,2024-01-15,5,14,21,22,32,2,11
24005,2024-01-13,9,15,19,30,33,1,6
24004,2024-01-10,1,12,14,27,35,7,9
24003,2024-01-08,8,11,20,24,31,3,12
";

pub fn seed_records() -> Vec<DrawRecord> {
    decode(SEED_CSV)
}
