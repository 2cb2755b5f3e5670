mod test_candidate_before_offer;
