//! NCBI E-utilities XML payloads: `esearch` id lists, gene `esummary`
//! document summaries and GEO DataSets `esummary` DocSums.
//!
//! Only the fields the tool servers use are modeled; everything else in the
//! payload is ignored. Numeric coordinates that do not parse are kept as
//! missing fields so the resolver can report the record as malformed.

use anyhow::{Result, anyhow};
use locus_resolver::GenomicRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneSummary {
    pub gene_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub organism: Option<String>,
    pub chromosome: Option<String>,
    pub map_location: Option<String>,
    /// Current locations first, then the location history in source order.
    pub records: Vec<GenomicRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeoDataset {
    pub uid: String,
    pub accession: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub platform: Option<String>,
    pub sample_count: Option<String>,
    pub release_date: Option<String>,
    pub organism: Option<String>,
    pub entry_type: Option<String>,
    pub gds_type: Option<String>,
}

pub fn parse_esearch_ids(xml: &str) -> Result<Vec<String>> {
    let parsed: ESearchResultXml =
        quick_xml::de::from_str(xml).map_err(|e| anyhow!("Malformed eSearchResult XML: {e}"))?;
    if let Some(error) = nonempty_owned(parsed.error.as_deref()) {
        return Err(anyhow!("ESearch reported an error: {error}"));
    }
    Ok(parsed
        .id_list
        .map(|list| {
            list.ids
                .iter()
                .filter_map(|id| nonempty_owned(Some(id)))
                .collect()
        })
        .unwrap_or_default())
}

pub fn parse_gene_summaries(xml: &str) -> Result<Vec<GeneSummary>> {
    let parsed: GeneESummaryXml = quick_xml::de::from_str(xml)
        .map_err(|e| anyhow!("Malformed gene eSummaryResult XML: {e}"))?;
    if let Some(error) = nonempty_owned(parsed.error.as_deref()) {
        return Err(anyhow!("ESummary reported an error: {error}"));
    }
    let summaries = parsed
        .set
        .map(|set| set.summaries)
        .unwrap_or_default()
        .into_iter()
        .map(gene_summary_from_xml)
        .collect::<Vec<_>>();
    if summaries.is_empty() {
        return Err(anyhow!(
            "Malformed gene eSummaryResult XML: no DocumentSummary records found"
        ));
    }
    Ok(summaries)
}

pub fn parse_geo_summaries(xml: &str) -> Result<Vec<GeoDataset>> {
    let parsed: GeoESummaryXml = quick_xml::de::from_str(xml)
        .map_err(|e| anyhow!("Malformed GEO eSummaryResult XML: {e}"))?;
    if let Some(error) = nonempty_owned(parsed.error.as_deref()) {
        return Err(anyhow!("ESummary reported an error: {error}"));
    }
    Ok(parsed.doc_sums.into_iter().map(geo_dataset_from_xml).collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename = "eSearchResult")]
struct ESearchResultXml {
    #[serde(rename = "IdList")]
    id_list: Option<IdListXml>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdListXml {
    #[serde(rename = "Id", default)]
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "eSummaryResult")]
struct GeneESummaryXml {
    #[serde(rename = "DocumentSummarySet")]
    set: Option<DocumentSummarySetXml>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentSummarySetXml {
    #[serde(rename = "DocumentSummary", default)]
    summaries: Vec<DocumentSummaryXml>,
}

#[derive(Debug, Deserialize)]
struct DocumentSummaryXml {
    #[serde(rename = "@uid")]
    uid: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Organism")]
    organism: Option<OrganismXml>,
    #[serde(rename = "Chromosome")]
    chromosome: Option<String>,
    #[serde(rename = "MapLocation")]
    map_location: Option<String>,
    #[serde(rename = "GenomicInfo")]
    genomic_info: Option<GenomicInfoXml>,
    #[serde(rename = "LocationHist")]
    location_hist: Option<LocationHistXml>,
}

#[derive(Debug, Deserialize)]
struct OrganismXml {
    #[serde(rename = "ScientificName")]
    scientific_name: Option<String>,
    #[serde(rename = "CommonName")]
    common_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenomicInfoXml {
    #[serde(rename = "GenomicInfoType", default)]
    entries: Vec<GenomicInfoTypeXml>,
}

#[derive(Debug, Deserialize)]
struct GenomicInfoTypeXml {
    #[serde(rename = "ChrAccVer")]
    chr_acc_ver: Option<String>,
    #[serde(rename = "ChrStart")]
    chr_start: Option<String>,
    #[serde(rename = "ChrStop")]
    chr_stop: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationHistXml {
    #[serde(rename = "LocationHistType", default)]
    entries: Vec<LocationHistTypeXml>,
}

#[derive(Debug, Deserialize)]
struct LocationHistTypeXml {
    #[serde(rename = "AnnotationRelease")]
    annotation_release: Option<String>,
    #[serde(rename = "AssemblyAccVer")]
    assembly_acc_ver: Option<String>,
    #[serde(rename = "ChrAccVer")]
    chr_acc_ver: Option<String>,
    #[serde(rename = "ChrStart")]
    chr_start: Option<String>,
    #[serde(rename = "ChrStop")]
    chr_stop: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "eSummaryResult")]
struct GeoESummaryXml {
    #[serde(rename = "DocSum", default)]
    doc_sums: Vec<DocSumXml>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocSumXml {
    #[serde(rename = "Id")]
    id: Option<String>,
    #[serde(rename = "Item", default)]
    items: Vec<DocSumItemXml>,
}

#[derive(Debug, Deserialize)]
struct DocSumItemXml {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "$text", default)]
    value: Option<String>,
}

fn gene_summary_from_xml(doc: DocumentSummaryXml) -> GeneSummary {
    let mut records = doc
        .genomic_info
        .map(|info| info.entries)
        .unwrap_or_default()
        .into_iter()
        .map(|entry| GenomicRecord {
            chromosome_accession: nonempty_owned(entry.chr_acc_ver.as_deref()),
            start: parse_coordinate(entry.chr_start.as_deref()),
            end: parse_coordinate(entry.chr_stop.as_deref()),
            annotation_release: None,
            assembly_accession: None,
            is_current: true,
        })
        .collect::<Vec<_>>();
    records.extend(
        doc.location_hist
            .map(|hist| hist.entries)
            .unwrap_or_default()
            .into_iter()
            .map(|entry| GenomicRecord {
                chromosome_accession: nonempty_owned(entry.chr_acc_ver.as_deref()),
                start: parse_coordinate(entry.chr_start.as_deref()),
                end: parse_coordinate(entry.chr_stop.as_deref()),
                annotation_release: nonempty_owned(entry.annotation_release.as_deref()),
                assembly_accession: nonempty_owned(entry.assembly_acc_ver.as_deref()),
                is_current: false,
            }),
    );

    let organism = doc.organism.and_then(|org| {
        nonempty_owned(org.scientific_name.as_deref())
            .or_else(|| nonempty_owned(org.common_name.as_deref()))
    });

    GeneSummary {
        gene_id: nonempty_owned(doc.uid.as_deref()).unwrap_or_default(),
        name: nonempty_owned(doc.name.as_deref()),
        description: nonempty_owned(doc.description.as_deref()),
        organism,
        chromosome: nonempty_owned(doc.chromosome.as_deref()),
        map_location: nonempty_owned(doc.map_location.as_deref()),
        records,
    }
}

fn geo_dataset_from_xml(doc: DocSumXml) -> GeoDataset {
    let mut dataset = GeoDataset {
        uid: nonempty_owned(doc.id.as_deref()).unwrap_or_default(),
        ..GeoDataset::default()
    };
    for item in doc.items {
        let value = nonempty_owned(item.value.as_deref());
        match item.name.as_str() {
            "Accession" => dataset.accession = value,
            "title" => dataset.title = value,
            "summary" => dataset.summary = value,
            "GPL" => dataset.platform = value.map(|gpl| platform_label(&gpl)),
            "n_samples" => dataset.sample_count = value,
            "PDAT" => dataset.release_date = value,
            "taxon" => dataset.organism = value,
            "entryType" => dataset.entry_type = value,
            "gdsType" => dataset.gds_type = value,
            _ => {}
        }
    }
    dataset
}

/// `"16791;20301"` -> `"GPL16791, GPL20301"`.
fn platform_label(raw: &str) -> String {
    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            if part.chars().all(|c| c.is_ascii_digit()) {
                format!("GPL{part}")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_coordinate(raw: Option<&str>) -> Option<u64> {
    nonempty_owned(raw)?.parse::<u64>().ok()
}

fn nonempty_owned(raw: Option<&str>) -> Option<String> {
    let text = raw.unwrap_or_default().trim();
    (!text.is_empty()).then_some(text.to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const TP53_ESEARCH: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult><Count>1</Count><RetMax>1</RetMax><RetStart>0</RetStart><IdList>
<Id>7157</Id>
</IdList><TranslationSet/><QueryTranslation>TP53[GENE] AND human[ORGN]</QueryTranslation></eSearchResult>
"#;

    pub const EMPTY_ESEARCH: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSearchResult><Count>0</Count><RetMax>0</RetMax><RetStart>0</RetStart><IdList/><TranslationSet/></eSearchResult>
"#;

    pub const TP53_ESUMMARY: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSummaryResult>
<DocumentSummarySet status="OK">
<DbBuild>Build250101-0000.1</DbBuild>
<DocumentSummary uid="7157">
<Name>TP53</Name>
<Description>tumor protein p53</Description>
<Status>0</Status>
<CurrentID>0</CurrentID>
<Chromosome>17</Chromosome>
<GeneticSource>genomic</GeneticSource>
<MapLocation>17p13.1</MapLocation>
<OtherAliases>BCC7, LFS1, P53</OtherAliases>
<NomenclatureSymbol>TP53</NomenclatureSymbol>
<Organism>
<ScientificName>Homo sapiens</ScientificName>
<CommonName>human</CommonName>
<TaxID>9606</TaxID>
</Organism>
<LocationHist>
<LocationHistType>
<AnnotationRelease>RS_2024_08</AnnotationRelease>
<AssemblyAccVer>GCF_000001405.40</AssemblyAccVer>
<ChrAccVer>NC_000017.11</ChrAccVer>
<ChrStart>7687489</ChrStart>
<ChrStop>7668420</ChrStop>
</LocationHistType>
<LocationHistType>
<AnnotationRelease>RS_2023_10</AnnotationRelease>
<AssemblyAccVer>GCF_000001405.40</AssemblyAccVer>
<ChrAccVer>NC_000017.11</ChrAccVer>
<ChrStart>7687489</ChrStart>
<ChrStop>7668401</ChrStop>
</LocationHistType>
<LocationHistType>
<AnnotationRelease>RS_2024_08</AnnotationRelease>
<AssemblyAccVer>GCF_009914755.1</AssemblyAccVer>
<ChrAccVer>NC_060941.1</ChrAccVer>
<ChrStart>7578100</ChrStart>
<ChrStop>7559012</ChrStop>
</LocationHistType>
</LocationHist>
<GenomicInfo>
<GenomicInfoType>
<ChrLoc>17</ChrLoc>
<ChrAccVer>NC_000017.11</ChrAccVer>
<ChrStart>7687489</ChrStart>
<ChrStop>7668420</ChrStop>
<ExonCount>12</ExonCount>
</GenomicInfoType>
</GenomicInfo>
</DocumentSummary>
</DocumentSummarySet>
</eSummaryResult>
"#;

    pub const GEO_ESUMMARY: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSummaryResult>
<DocSum>
<Id>200245678</Id>
<Item Name="Accession" Type="String">GSE245678</Item>
<Item Name="title" Type="String">Single-cell RNA-seq of human glioblastoma</Item>
<Item Name="summary" Type="String">We profiled tumor cells with 10x Chromium.</Item>
<Item Name="GPL" Type="String">24676;20301</Item>
<Item Name="GSE" Type="String">245678</Item>
<Item Name="taxon" Type="String">Homo sapiens</Item>
<Item Name="entryType" Type="String">GSE</Item>
<Item Name="gdsType" Type="String">Expression profiling by high throughput sequencing</Item>
<Item Name="PDAT" Type="String">2024/03/15</Item>
<Item Name="n_samples" Type="Integer">12</Item>
</DocSum>
<DocSum>
<Id>200111111</Id>
<Item Name="Accession" Type="String">GSE111111</Item>
<Item Name="title" Type="String">Bulk RNA-seq of liver biopsies</Item>
<Item Name="summary" Type="String"></Item>
<Item Name="GPL" Type="String">16791</Item>
<Item Name="taxon" Type="String">Homo sapiens</Item>
<Item Name="PDAT" Type="String">2019/01/02</Item>
<Item Name="n_samples" Type="Integer">40</Item>
</DocSum>
</eSummaryResult>
"#;
}
